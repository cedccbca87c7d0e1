#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Deferred {
    /// Ends the power-up unless a later activation replaced `generation`.
    PowerUpExpiry { generation: u64 },
    SirenResume,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Scheduled {
    due_ms: u64,
    seq: u64,
    effect: Deferred,
}

/// Deferred effects keyed by simulation-clock deadline, fired in deadline
/// order (insertion order on equal deadlines).
#[derive(Clone, Debug, Default)]
pub(crate) struct Schedule {
    entries: Vec<Scheduled>,
    next_seq: u64,
}

impl Schedule {
    pub fn push(&mut self, due_ms: u64, effect: Deferred) {
        let entry = Scheduled {
            due_ms,
            seq: self.next_seq,
            effect,
        };
        self.next_seq = self.next_seq.saturating_add(1);
        let index = self
            .entries
            .partition_point(|other| (other.due_ms, other.seq) <= (entry.due_ms, entry.seq));
        self.entries.insert(index, entry);
    }

    pub fn drain_due(&mut self, now_ms: u64) -> Vec<Deferred> {
        let split = self.entries.partition_point(|entry| entry.due_ms <= now_ms);
        self.entries.drain(..split).map(|entry| entry.effect).collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
