use serde_json::Value;

/// Get a value from a JSON document by path.
///
/// Returns `None` if any step is missing, an array step is not an index, or
/// a scalar is reached before the path ends.
pub fn get<'a, S: AsRef<str>>(val: &'a Value, path: &[S]) -> Option<&'a Value> {
    let mut current = val;
    for step in path {
        let step = step.as_ref();
        current = match current {
            Value::Array(arr) => arr.get(step.parse::<usize>().ok()?)?,
            Value::Object(map) => map.get(step)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Get a mutable reference to a value in a JSON document by path.
pub fn get_mut<'a, S: AsRef<str>>(val: &'a mut Value, path: &[S]) -> Option<&'a mut Value> {
    let mut current = val;
    for step in path {
        let step = step.as_ref();
        current = match current {
            Value::Array(arr) => arr.get_mut(step.parse::<usize>().ok()?)?,
            Value::Object(map) => map.get_mut(step)?,
            _ => return None,
        };
    }
    Some(current)
}
