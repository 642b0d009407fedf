//! Work queue of fixed plaintext prefixes.
//!
//! Parallelism boundary of the whole decoder: every sequence of `depth`
//! letters over a frequency-ordered alphabet becomes one work item, and
//! workers pull items until the queue drains. The alphabet is ordered by
//! expected English letter frequency at the start of a word (slightly
//! tweaked), so promising prefixes are searched first.

use crossbeam_channel::{unbounded, Receiver};

/// Alphabet enumeration order for prefix generation.
pub const PREFIX_ALPHABET: &[u8] = b"taioswcbphfmdrelngyukvqxz";

/// A drained-once queue of `(index, prefix)` work items.
#[derive(Clone)]
pub struct PrefixQueue {
    rx: Receiver<(usize, String)>,
    total: usize,
}

impl PrefixQueue {
    /// Enumerate all `depth`-letter prefixes in alphabet order. Depth zero
    /// yields a single empty prefix.
    pub fn new(depth: usize) -> Self {
        let mut list = Vec::new();
        let mut buf = String::new();
        fill(depth, &mut buf, &mut list);

        let total = list.len();
        let (tx, rx) = unbounded();
        for item in list.into_iter().enumerate() {
            let _ = tx.send(item);
        }
        drop(tx);
        PrefixQueue { rx, total }
    }

    /// Next work item, or `None` when the queue is drained.
    pub fn pop(&self) -> Option<(usize, String)> {
        self.rx.recv().ok()
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }
}

fn fill(n: usize, buf: &mut String, list: &mut Vec<String>) {
    if n == 0 {
        list.push(buf.clone());
        return;
    }
    for &ch in PREFIX_ALPHABET {
        buf.push(ch as char);
        fill(n - 1, buf, list);
        buf.pop();
    }
}
