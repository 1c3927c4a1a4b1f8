//! Default-flag propagation for inserted output values.
//!
//! A node may only be flagged default when everything between it and the
//! nearest boundary node above is flagged default as well. Boundary nodes,
//! presence containers and keyed list entries, are never flagged by
//! propagation because their existence is data in its own right.

use opbridge_tree::{Document, Inserted, NodeId, TreeError};

/// Flag changes made by one propagation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Propagation {
    /// Nodes newly flagged default.
    pub marked: usize,
    /// Nodes whose default flag was cleared.
    pub cleared: usize,
}

/// Keeps default flags consistent after each output insertion.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPropagator;

impl DefaultPropagator {
    /// Updates default flags after `inserted` was placed in `document`.
    ///
    /// The propagation starts at the top-most created node, or at the target
    /// when the insertion only updated an existing node.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::StaleNode`] when the insertion handles do not
    /// belong to `document`.
    pub fn apply(
        self,
        document: &mut Document,
        inserted: Inserted,
        is_default: bool,
    ) -> Result<Propagation, TreeError> {
        if is_default {
            Self::mark(document, inserted.top, inserted.target)
        } else {
            Self::clear(document, inserted.top)
        }
    }

    /// Flags the chain from `bottom` up to `start` as default.
    ///
    /// The walk begins at the deepest node reached from `target` along first
    /// children and stops early at a boundary node, at a list key, or at a
    /// node that already holds an explicit child.
    fn mark(document: &mut Document, start: NodeId, target: NodeId) -> Result<Propagation, TreeError> {
        let mut propagation = Propagation::default();
        let mut cursor = Self::bottom(document, target);
        loop {
            if document.is_boundary(cursor) || Self::is_key(document, cursor)? {
                break;
            }
            let has_explicit_child = document
                .children(cursor)
                .iter()
                .any(|child| !document.is_default(*child));
            if has_explicit_child {
                break;
            }
            if !document.is_default(cursor) {
                document.set_default(cursor, true)?;
                propagation.marked += 1;
            }
            if cursor == start {
                break;
            }
            match document.parent(cursor) {
                Some(parent) => cursor = parent,
                None => break,
            }
        }
        Ok(propagation)
    }

    fn bottom(document: &Document, target: NodeId) -> NodeId {
        let mut cursor = target;
        while document.kind(cursor).is_some_and(|kind| !kind.is_terminal())
            && let Some(child) = document.first_child(cursor)
        {
            cursor = child;
        }
        cursor
    }

    fn is_key(document: &Document, id: NodeId) -> Result<bool, TreeError> {
        let Some(parent) = document.parent(id) else {
            return Ok(false);
        };
        let name = document.schema_of(id)?.name();
        Ok(document.schema_of(parent)?.is_key(name))
    }

    /// Clears the flag of `start` and of every default ancestor above it.
    fn clear(document: &mut Document, start: NodeId) -> Result<Propagation, TreeError> {
        let mut propagation = Propagation::default();
        if document.is_default(start) {
            document.set_default(start, false)?;
            propagation.cleared += 1;
        }
        let mut cursor = document.parent(start);
        while let Some(ancestor) = cursor.filter(|id| document.is_default(*id)) {
            document.set_default(ancestor, false)?;
            propagation.cleared += 1;
            cursor = document.parent(ancestor);
        }
        Ok(propagation)
    }
}

#[cfg(test)]
mod tests {
    use opbridge_tree::fixtures::{example_schema, reboot_document};
    use opbridge_tree::{InsertOptions, NodeContent};
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn reply() -> Document {
        let schema = example_schema().expect("schema");
        reboot_document(&schema).expect("document")
    }

    fn insert(document: &mut Document, path: &str, value: &str, is_default: bool) -> Inserted {
        let inserted = document
            .insert_path(path, NodeContent::text(value), InsertOptions::output_update())
            .expect("insert");
        DefaultPropagator
            .apply(document, inserted, is_default)
            .expect("propagate");
        inserted
    }

    fn flag(document: &Document, path: &str) -> bool {
        let id = std::iter::once(document.root())
            .chain(document.descendants(document.root()))
            .find(|id| document.path_of(*id).is_ok_and(|p| p == path))
            .expect("node at path");
        document.is_default(id)
    }

    #[rstest]
    fn default_values_mark_non_boundary_ancestors(mut reply: Document) {
        insert(&mut reply, "/ex:reboot/stats/restarts", "0", true);
        assert!(flag(&reply, "/ex:reboot/stats/restarts"));
        assert!(flag(&reply, "/ex:reboot/stats"));
        assert!(!reply.is_default(reply.root()), "operation nodes are never created here");
    }

    #[rstest]
    fn marking_stops_at_presence_container(mut reply: Document) {
        insert(&mut reply, "/ex:reboot/summary/detail/timing/elapsed", "0", true);
        assert!(flag(&reply, "/ex:reboot/summary/detail/timing/elapsed"));
        assert!(flag(&reply, "/ex:reboot/summary/detail/timing"));
        assert!(flag(&reply, "/ex:reboot/summary/detail"));
        assert!(!flag(&reply, "/ex:reboot/summary"));
    }

    #[rstest]
    fn marking_stops_at_keyed_list_entry(mut reply: Document) {
        insert(&mut reply, "/ex:reboot/log[seq='1']/msg", "boot", true);
        assert!(flag(&reply, "/ex:reboot/log[seq='1']/msg"));
        assert!(!flag(&reply, "/ex:reboot/log[seq='1']/seq"), "keys are never defaults");
        assert!(!flag(&reply, "/ex:reboot/log[seq='1']"));
    }

    #[rstest]
    fn explicit_values_clear_default_ancestors(mut reply: Document) {
        insert(&mut reply, "/ex:reboot/summary/detail/timing/elapsed", "0", true);
        insert(&mut reply, "/ex:reboot/summary/detail/timing/unit", "s", false);
        assert!(flag(&reply, "/ex:reboot/summary/detail/timing/elapsed"));
        assert!(!flag(&reply, "/ex:reboot/summary/detail/timing"));
        assert!(!flag(&reply, "/ex:reboot/summary/detail"));
        assert!(!flag(&reply, "/ex:reboot/summary"));
    }

    #[rstest]
    #[case::explicit_first(&[("unit", "s", false), ("elapsed", "0", true)])]
    #[case::default_first(&[("elapsed", "0", true), ("unit", "s", false)])]
    fn final_flags_do_not_depend_on_order(
        mut reply: Document,
        #[case] values: &[(&str, &str, bool)],
    ) {
        for (leaf, value, is_default) in values {
            let path = format!("/ex:reboot/summary/detail/timing/{leaf}");
            insert(&mut reply, &path, value, *is_default);
        }
        let flags: Vec<bool> = [
            "/ex:reboot/summary",
            "/ex:reboot/summary/detail",
            "/ex:reboot/summary/detail/timing",
            "/ex:reboot/summary/detail/timing/elapsed",
            "/ex:reboot/summary/detail/timing/unit",
        ]
        .iter()
        .map(|path| flag(&reply, path))
        .collect();
        assert_eq!(flags, [false, false, false, true, false]);
    }

    #[rstest]
    fn default_value_under_explicit_sibling_keeps_parent_explicit(mut reply: Document) {
        insert(&mut reply, "/ex:reboot/stats/uptime", "9", false);
        let second = insert(&mut reply, "/ex:reboot/stats/restarts", "0", true);
        assert_eq!(second.top, second.target);
        assert!(flag(&reply, "/ex:reboot/stats/restarts"));
        assert!(!flag(&reply, "/ex:reboot/stats"));
    }

    #[rstest]
    fn clearing_reports_changes(mut reply: Document) {
        insert(&mut reply, "/ex:reboot/stats/restarts", "0", true);
        let inserted = reply
            .insert_path(
                "/ex:reboot/stats/uptime",
                NodeContent::text("1"),
                InsertOptions::output_update(),
            )
            .expect("insert");
        let propagation = DefaultPropagator
            .apply(&mut reply, inserted, false)
            .expect("propagate");
        assert_eq!(propagation, Propagation { marked: 0, cleared: 1 });
    }
}
