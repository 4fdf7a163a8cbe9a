use form_tree_pointer::is_owner_of;

/// Owner ids that address `target` or one of its ancestors, most specific
/// first.
///
/// Equal-length owners cannot both own the same target, so the order is
/// fully determined by length.
pub fn owners_of<'a, I>(owners: I, target: &str) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut matched: Vec<&str> = owners
        .into_iter()
        .map(String::as_str)
        .filter(|owner| is_owner_of(owner, target))
        .collect();
    matched.sort_by(|a, b| b.len().cmp(&a.len()));
    matched
}
