//! Refinements, converters and pipes.
use super::{Env, Mode, Pass, descend};
use crate::schema::{Converter, Predicate, Schema};
use crate::value::Value;

/// The predicate sees the base's output; refine itself never converts.
pub(super) fn refine<M: Mode>(
    base: &Schema,
    predicate: &Predicate,
    value: &Value,
    env: Env<'_>,
) -> Result<Pass, M::Error> {
    let pass = descend::<M>(base, value, env)?;
    let current = pass.resolve(value);
    if predicate.test(current) {
        Ok(pass)
    } else {
        Err(M::fail(|| predicate.unmet_message(current)))
    }
}

pub(super) fn convert<M: Mode>(converter: &Converter, value: &Value) -> Result<Pass, M::Error> {
    match converter.apply(value) {
        Ok(next) => Ok(Pass::Replaced(next)),
        Err(message) => Err(M::fail(|| message)),
    }
}

/// Stages apply to the whole value, so failures are passed up untouched.
pub(super) fn pipe<M: Mode>(stages: &[Schema], value: &Value, env: Env<'_>) -> Result<Pass, M::Error> {
    let mut current: Option<Value> = None;
    for stage in stages {
        let input = current.as_ref().unwrap_or(value);
        if let Pass::Replaced(next) = descend::<M>(stage, input, env)? {
            current = Some(next);
        }
    }
    Ok(current.map_or(Pass::Kept, Pass::Replaced))
}

// ------------------------------- Tests ------------------------------------ //
