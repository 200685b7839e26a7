use rand::seq::index;
use rand::Rng;
use std::collections::HashSet;

/// Pick up to `max` distinct link names, uniformly without replacement.
///
/// Duplicates and empty names are removed first. The sample keeps the
/// original link order so that ranking ties resolve the same way for a given
/// seed.
pub fn sample_frontier<R: Rng + ?Sized>(links: &[String], max: usize, rng: &mut R) -> Vec<String> {
    let mut seen = HashSet::with_capacity(links.len());
    let distinct: Vec<&String> = links
        .iter()
        .filter(|link| !link.is_empty() && seen.insert(link.as_str()))
        .collect();

    if distinct.len() <= max {
        return distinct.into_iter().cloned().collect();
    }

    let mut picked = index::sample(rng, distinct.len(), max).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| distinct[i].clone()).collect()
}
