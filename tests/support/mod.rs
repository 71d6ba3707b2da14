//! Minimal `OutboundItem`/`PriorityQueue` test double, standing in for the
//! session's real DATA-frame handles and min-heap. Shared by every
//! integration test in this directory.

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use h2_priority::{OutboundItem, PriorityQueue};

#[derive(Clone, Debug)]
pub struct Item {
    id: u32,
    queued: Rc<Cell<bool>>,
}

impl Item {
    pub fn new(id: u32) -> Self {
        Item {
            id,
            queued: Rc::new(Cell::new(false)),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl OutboundItem for Item {
    fn is_queued(&self) -> bool {
        self.queued.get()
    }

    fn mark_queued(&self) {
        self.queued.set(true);
    }
}

#[derive(Default)]
pub struct Queue(pub Vec<Item>);

impl PriorityQueue<Item> for Queue {
    type Error = Infallible;

    fn push(&mut self, item: Item) -> Result<(), Self::Error> {
        self.0.push(item);
        Ok(())
    }
}

impl Queue {
    pub fn ids(&self) -> Vec<u32> {
        self.0.iter().map(Item::id).collect()
    }
}
