use std::collections::HashMap;

use crate::addrs::AbsResourceInstance;
use crate::providers::ImportedResource;

/// Compute the address each discovered object will be written to.
///
/// A non-empty type name on the object replaces the base address's type. When
/// several objects land on the same address, the first keeps it and later ones
/// get `-1`, `-2`, ... appended to the resource name, in discovery order. The
/// counters belong to this one call.
pub fn resolve_target_addresses(
    base: &AbsResourceInstance,
    objects: &[ImportedResource],
) -> Vec<AbsResourceInstance> {
    let mut name_counter: HashMap<String, usize> = HashMap::new();

    objects
        .iter()
        .map(|object| {
            let addr = if object.type_name.is_empty() {
                base.clone()
            } else {
                base.with_type(object.type_name.as_str())
            };

            let seen = name_counter.entry(addr.to_string()).or_insert(0);
            *seen += 1;
            match *seen {
                1 => addr,
                n => addr.with_name_suffix(n - 1),
            }
        })
        .collect()
}
