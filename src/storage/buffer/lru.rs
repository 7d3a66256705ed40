use super::replacer::{FrameId, Replacer};

#[derive(Debug, Clone, Copy, Default)]
struct Link {
    prev: Option<FrameId>,
    next: Option<FrameId>,
    linked: bool,
}

/// Strict LRU over frame ids.
///
/// The recency list is intrusive: one `Link` per frame id, indexed by the id itself, so
/// access, removal and victim selection are all O(1).
#[derive(Debug, Default)]
pub struct LruReplacer {
    links: Vec<Link>,
    /// Most recently used
    head: Option<FrameId>,
    /// Least recently used
    tail: Option<FrameId>,
    len: usize,
}

impl LruReplacer {
    pub fn new(max_size: usize) -> Self {
        Self {
            links: vec![Link::default(); max_size],
            ..Self::default()
        }
    }

    fn unlink(&mut self, frame_id: FrameId) {
        let Link { prev, next, .. } = self.links[frame_id];
        match prev {
            Some(p) => self.links[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.links[n].prev = prev,
            None => self.tail = prev,
        }
        self.links[frame_id] = Link::default();
        self.len -= 1;
    }

    fn push_front(&mut self, frame_id: FrameId) {
        self.links[frame_id] = Link {
            prev: None,
            next: self.head,
            linked: true,
        };
        match self.head {
            Some(h) => self.links[h].prev = Some(frame_id),
            None => self.tail = Some(frame_id),
        }
        self.head = Some(frame_id);
        self.len += 1;
    }

    fn is_linked(&self, frame_id: FrameId) -> bool {
        self.links.get(frame_id).is_some_and(|l| l.linked)
    }
}

impl Replacer for LruReplacer {
    fn record_access(&mut self, frame_id: FrameId) {
        if frame_id >= self.links.len() {
            self.links.resize(frame_id + 1, Link::default());
        }
        if self.head == Some(frame_id) {
            return;
        }
        if self.links[frame_id].linked {
            self.unlink(frame_id);
        }
        self.push_front(frame_id);
    }

    fn remove(&mut self, frame_id: FrameId) {
        if self.is_linked(frame_id) {
            self.unlink(frame_id);
        }
    }

    fn victim(&self) -> Option<FrameId> {
        self.tail
    }

    fn size(&self) -> usize {
        self.len
    }
}
