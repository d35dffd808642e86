//! # Arena-based Linked List
//!
//! Instructions inside a block and blocks inside a function are kept in
//! intrusive doubly-linked lists whose nodes live in the IR arenas. A node
//! knows its container, so "is this block attached" is a constant-time query.

use super::storage::ArenaPtr;

/// A container of a linked list.
///
/// The container only records the head and the tail, the links are stored in
/// the nodes themselves.
pub trait LinkedListContainerPtr<NodePtr>: ArenaPtr
where
    NodePtr: LinkedListNodePtr<A = Self::A, ContainerPtr = Self>,
{
    /// Get the head of the linked list.
    ///
    /// The head and the tail are either both `Some` or both `None`.
    fn head(self, arena: &Self::A) -> Option<NodePtr>;

    fn tail(self, arena: &Self::A) -> Option<NodePtr>;

    /// Low-level setter, use [push_front](Self::push_front) or
    /// [push_back](Self::push_back) instead.
    fn set_head(self, arena: &mut Self::A, head: Option<NodePtr>);

    fn set_tail(self, arena: &mut Self::A, tail: Option<NodePtr>);

    /// Push a node to the front of the linked list.
    ///
    /// # Panics
    ///
    /// Panics if the node is already in a container.
    fn push_front(self, arena: &mut Self::A, node: NodePtr) {
        assert!(
            node.container(arena).is_none(),
            "the node is already in another container"
        );

        if let Some(head) = self.head(arena) {
            head.insert_before(arena, node);
        } else {
            self.set_head(arena, Some(node));
            self.set_tail(arena, Some(node));
            node.set_container(arena, Some(self))
        }
    }

    /// Push a node to the back of the linked list.
    ///
    /// # Panics
    ///
    /// Panics if the node is already in a container.
    fn push_back(self, arena: &mut Self::A, node: NodePtr) {
        assert!(
            node.container(arena).is_none(),
            "the node is already in another container"
        );

        if let Some(tail) = self.tail(arena) {
            tail.insert_after(arena, node);
        } else {
            self.set_head(arena, Some(node));
            self.set_tail(arena, Some(node));
            node.set_container(arena, Some(self))
        }
    }

    fn iter(self, arena: &Self::A) -> LinkedListIterator<'_, NodePtr> {
        LinkedListIterator {
            arena,
            curr: self.head(arena),
        }
    }
}

pub struct LinkedListIterator<'a, T: LinkedListNodePtr> {
    arena: &'a T::A,
    curr: Option<T>,
}

impl<'a, T: LinkedListNodePtr> Iterator for LinkedListIterator<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let curr = self.curr;
        self.curr = curr.and_then(|n| n.next(self.arena));
        curr
    }
}

/// A node in a linked list.
pub trait LinkedListNodePtr: ArenaPtr {
    type ContainerPtr: LinkedListContainerPtr<Self, A = Self::A>;

    fn next(self, arena: &Self::A) -> Option<Self>;

    fn prev(self, arena: &Self::A) -> Option<Self>;

    fn set_next(self, arena: &mut Self::A, next: Option<Self>);

    fn set_prev(self, arena: &mut Self::A, prev: Option<Self>);

    fn container(self, arena: &Self::A) -> Option<Self::ContainerPtr>;

    fn set_container(self, arena: &mut Self::A, container: Option<Self::ContainerPtr>);

    /// Insert `node` right after `self`.
    ///
    /// # Panics
    ///
    /// Panics if `self` is detached or `node` is already attached.
    fn insert_after(self, arena: &mut Self::A, node: Self) {
        let container = self
            .container(arena)
            .expect("cannot insert after a node without container");
        assert!(
            node.container(arena).is_none(),
            "cannot insert a node that already belongs to a container"
        );

        if let Some(next) = self.next(arena) {
            next.set_prev(arena, Some(node));
            node.set_next(arena, Some(next));
        }

        node.set_prev(arena, Some(self));
        self.set_next(arena, Some(node));

        if container.tail(arena) == Some(self) {
            container.set_tail(arena, Some(node));
        }

        node.set_container(arena, Some(container));
    }

    /// Insert `node` right before `self`.
    ///
    /// # Panics
    ///
    /// Panics if `self` is detached or `node` is already attached.
    fn insert_before(self, arena: &mut Self::A, node: Self) {
        let container = self
            .container(arena)
            .expect("cannot insert before a node without container");
        assert!(
            node.container(arena).is_none(),
            "cannot insert a node that already belongs to a container"
        );

        if let Some(prev) = self.prev(arena) {
            prev.set_next(arena, Some(node));
            node.set_prev(arena, Some(prev));
        }

        node.set_next(arena, Some(self));
        self.set_prev(arena, Some(node));

        if container.head(arena) == Some(self) {
            container.set_head(arena, Some(node));
        }

        node.set_container(arena, Some(container));
    }
}

#[cfg(test)]
mod tests {
    use super::{LinkedListContainerPtr, LinkedListNodePtr};
    use crate::{
        collections::storage::{ArenaAlloc, ArenaPtr, BaseArena, BaseArenaPtr},
        impl_arena,
    };

    #[derive(Debug, Hash, Clone, Copy, PartialEq, Eq)]
    struct NodePtr(BaseArenaPtr<Node>);

    struct Node {
        next: Option<NodePtr>,
        prev: Option<NodePtr>,
        parent: Option<ListPtr>,
    }

    #[derive(Debug, Hash, Clone, Copy, PartialEq, Eq)]
    struct ListPtr(BaseArenaPtr<List>);

    struct List {
        head: Option<NodePtr>,
        tail: Option<NodePtr>,
    }

    #[derive(Default)]
    struct Arena {
        nodes: BaseArena<Node>,
        lists: BaseArena<List>,
    }

    impl_arena!(Arena, Node, NodePtr, nodes);
    impl_arena!(Arena, List, ListPtr, lists);

    impl LinkedListContainerPtr<NodePtr> for ListPtr {
        fn head(self, arena: &Arena) -> Option<NodePtr> { self.deref(arena).head }

        fn tail(self, arena: &Arena) -> Option<NodePtr> { self.deref(arena).tail }

        fn set_head(self, arena: &mut Arena, head: Option<NodePtr>) {
            self.deref_mut(arena).head = head;
        }

        fn set_tail(self, arena: &mut Arena, tail: Option<NodePtr>) {
            self.deref_mut(arena).tail = tail;
        }
    }

    impl LinkedListNodePtr for NodePtr {
        type ContainerPtr = ListPtr;

        fn next(self, arena: &Arena) -> Option<Self> { self.deref(arena).next }

        fn prev(self, arena: &Arena) -> Option<Self> { self.deref(arena).prev }

        fn set_next(self, arena: &mut Arena, next: Option<Self>) {
            self.deref_mut(arena).next = next;
        }

        fn set_prev(self, arena: &mut Arena, prev: Option<Self>) {
            self.deref_mut(arena).prev = prev;
        }

        fn container(self, arena: &Arena) -> Option<ListPtr> { self.deref(arena).parent }

        fn set_container(self, arena: &mut Arena, container: Option<ListPtr>) {
            self.deref_mut(arena).parent = container;
        }
    }

    fn node(arena: &mut Arena) -> NodePtr {
        arena.alloc(Node {
            next: None,
            prev: None,
            parent: None,
        })
    }

    #[test]
    fn test_linked_list_push_front_and_back() {
        let mut arena = Arena::default();
        let list = arena.alloc(List {
            head: None,
            tail: None,
        });

        let n1 = node(&mut arena);
        let n2 = node(&mut arena);
        let n3 = node(&mut arena);

        assert_eq!(list.iter(&arena).next(), None);

        list.push_back(&mut arena, n1);
        list.push_back(&mut arena, n2);
        // front insertion keeps the existing order behind it
        list.push_front(&mut arena, n3);

        assert_eq!(list.iter(&arena).collect::<Vec<_>>(), [n3, n1, n2]);
        assert_eq!(list.head(&arena), Some(n3));
        assert_eq!(list.tail(&arena), Some(n2));
        assert_eq!(n3.prev(&arena), None);
        assert_eq!(n1.prev(&arena), Some(n3));
        assert_eq!(n2.next(&arena), None);
        for n in [n1, n2, n3] {
            assert_eq!(n.container(&arena), Some(list));
        }
    }

    #[test]
    #[should_panic]
    fn test_linked_list_double_push() {
        let mut arena = Arena::default();
        let list = arena.alloc(List {
            head: None,
            tail: None,
        });
        let n1 = node(&mut arena);
        list.push_back(&mut arena, n1);
        list.push_back(&mut arena, n1);
    }
}
