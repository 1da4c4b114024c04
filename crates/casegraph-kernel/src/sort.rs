//! Parent-before-child ordering for flat element lists.
//!
//! Kahn's algorithm over the parent → child relation, restricted to ids that
//! are present in the input. Elements whose parent is missing sort as roots.
//! Anything never drained (a cycle) is appended in input order, so the output
//! is always a permutation of the input.

use std::collections::{HashMap, HashSet, VecDeque};
use tracing::warn;

use crate::element::Element;

/// Order `elements` so every element follows its parent.
pub fn sort_by_dependency(elements: Vec<Element>) -> Vec<Element> {
    let present: HashSet<&str> = elements.iter().map(|e| e.id.as_str()).collect();

    let mut children: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut in_degree = vec![0usize; elements.len()];
    for (idx, element) in elements.iter().enumerate() {
        if let Some(parent) = element.parent_id.as_deref()
            && present.contains(parent)
        {
            children.entry(parent).or_default().push(idx);
            in_degree[idx] = 1;
        }
    }

    let mut queue: VecDeque<usize> = (0..elements.len())
        .filter(|idx| in_degree[*idx] == 0)
        .collect();
    let mut order = Vec::with_capacity(elements.len());
    let mut placed = vec![false; elements.len()];
    while let Some(idx) = queue.pop_front() {
        order.push(idx);
        placed[idx] = true;
        // Taking the list means duplicate ids release their children once.
        if let Some(ready) = children.remove(elements[idx].id.as_str()) {
            for child in ready {
                in_degree[child] -= 1;
                if in_degree[child] == 0 {
                    queue.push_back(child);
                }
            }
        }
    }

    let leftover: Vec<usize> = (0..elements.len()).filter(|idx| !placed[*idx]).collect();
    if !leftover.is_empty() {
        warn!(
            count = leftover.len(),
            "elements left unsorted by dependency (cycle); appending in input order"
        );
        order.extend(leftover);
    }

    let mut slots: Vec<Option<Element>> = elements.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementType;

    fn element(id: &str, parent: Option<&str>) -> Element {
        let element = Element::new(id, ElementType::PropertyClaim, id);
        match parent {
            Some(parent) => element.with_parent(parent),
            None => element,
        }
    }

    fn ids(elements: &[Element]) -> Vec<&str> {
        elements.iter().map(|e| e.id.as_str()).collect()
    }

    fn assert_parents_first(sorted: &[Element]) {
        let present: HashSet<&str> = sorted.iter().map(|e| e.id.as_str()).collect();
        let mut seen = HashSet::new();
        for element in sorted {
            if let Some(parent) = element.parent_id.as_deref()
                && present.contains(parent)
            {
                assert!(seen.contains(parent), "{} placed before {parent}", element.id);
            }
            seen.insert(element.id.as_str());
        }
    }

    #[test]
    fn children_listed_first_are_moved_after_parents() {
        let input = vec![
            element("c2", Some("c1")),
            element("c1", Some("g")),
            element("e", None),
            element("g", None),
        ];
        let sorted = sort_by_dependency(input);
        assert_eq!(ids(&sorted), vec!["e", "g", "c1", "c2"]);
        assert_parents_first(&sorted);
    }

    #[test]
    fn dangling_parents_sort_as_roots() {
        let input = vec![element("a", Some("missing")), element("b", Some("a"))];
        let sorted = sort_by_dependency(input);
        assert_eq!(ids(&sorted), vec!["a", "b"]);
    }

    #[test]
    fn cycles_are_appended_not_dropped() {
        let input = vec![
            element("x", Some("y")),
            element("y", Some("x")),
            element("root", None),
        ];
        let sorted = sort_by_dependency(input);
        assert_eq!(ids(&sorted), vec!["root", "x", "y"]);
    }

    #[test]
    fn output_is_a_permutation_even_with_duplicate_ids() {
        let input = vec![
            element("c", Some("p")),
            element("p", None),
            element("p", None),
            element("d", Some("c")),
        ];
        let sorted = sort_by_dependency(input);
        let mut got = ids(&sorted);
        got.sort_unstable();
        assert_eq!(got, vec!["c", "d", "p", "p"]);
        assert_parents_first(&sorted);
    }

    #[test]
    fn empty_input_sorts_to_empty() {
        assert!(sort_by_dependency(Vec::new()).is_empty());
    }
}
