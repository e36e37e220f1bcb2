//! Grouping of draw calls by their serialized group data.
//!
//! Calls whose [`GroupKey`]s are byte-equal share one entry of the shader's
//! group table. A submission can address at most as many groups as that
//! table holds, so the accumulator hands batches out in bounded drains.

use crate::scene::DrawCall;

use super::group::GroupKey;

/// Calls sharing one group key, in insertion order.
#[derive(Debug, Clone)]
pub struct Batch {
    key: GroupKey,
    members: Vec<DrawCall>,
    instances: usize,
}

impl Batch {
    #[inline]
    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    #[inline]
    pub fn members(&self) -> &[DrawCall] {
        &self.members
    }

    #[inline]
    pub fn instance_count(&self) -> usize {
        self.instances
    }
}

/// A call removed from the accumulator, tagged with its index into the
/// drained group table.
#[derive(Debug, Clone, PartialEq)]
pub struct DrainedCall {
    pub group: u32,
    pub call: DrawCall,
}

/// The contents of one GPU submission.
#[derive(Debug, Clone, Default)]
pub struct Drain {
    /// Group table entries; `DrainedCall::group` indexes into this.
    pub keys: Vec<GroupKey>,
    /// Member calls, batch by batch.
    pub calls: Vec<DrainedCall>,
    /// Sum of `instance_count()` over `calls`.
    pub instance_count: usize,
}

impl Drain {
    #[inline]
    pub fn groups(&self) -> usize {
        self.keys.len()
    }

    /// Stable-sorts the calls back to front (descending depth).
    ///
    /// Calls at equal depth keep their drain order, and group tags travel
    /// with their calls so the table stays valid.
    pub fn sort_back_to_front(&mut self) {
        self.calls.sort_by(|a, b| b.call.depth().total_cmp(&a.call.depth()));
    }

    /// Group table entries back to back.
    pub fn uniform_bytes(&self) -> Vec<u8> {
        self.keys.iter().flat_map(|k| k.as_bytes().iter().copied()).collect()
    }
}

/// Pending draw calls of one shape kind, grouped by key.
#[derive(Debug, Default)]
pub struct BatchAccumulator {
    batches: Vec<Batch>,
}

impl BatchAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `call` to the batch with the same key, opening a new batch if
    /// none matches.
    pub fn add_shape(&mut self, call: DrawCall) {
        let key = GroupKey::serialize(&call);
        let instances = call.instance_count();
        match self.batches.iter_mut().find(|b| b.key == key) {
            Some(batch) => {
                batch.instances += instances;
                batch.members.push(call);
            }
            None => self.batches.push(Batch { key, members: vec![call], instances }),
        }
    }

    /// Removes up to `max_groups` batches, most recently opened first.
    ///
    /// Returns `None` once the accumulator is empty. A `max_groups` of zero is
    /// treated as one so draining always makes progress.
    pub fn drain_next(&mut self, max_groups: usize) -> Option<Drain> {
        if self.batches.is_empty() {
            return None;
        }
        let take = max_groups.max(1).min(self.batches.len());

        let mut drain = Drain::default();
        for _ in 0..take {
            let Some(batch) = self.batches.pop() else { break };
            let group = drain.keys.len() as u32;
            drain.instance_count += batch.instances;
            drain.calls.extend(batch.members.into_iter().map(|call| DrainedCall { group, call }));
            drain.keys.push(batch.key);
        }
        Some(drain)
    }

    #[inline]
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Open batches (distinct keys).
    #[inline]
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn pending_calls(&self) -> usize {
        self.batches.iter().map(|b| b.members.len()).sum()
    }

    pub fn pending_instances(&self) -> usize {
        self.batches.iter().map(|b| b.instances).sum()
    }

    pub fn clear(&mut self) {
        self.batches.clear();
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::coords::Rect;
    use crate::paint::Color;
    use crate::scene::{FillCall, TextCall};
    use crate::text::FontId;

    fn fill(clip_x: f32, tag: f32) -> DrawCall {
        FillCall::new(Rect::new(tag, 0.0, 1.0, 1.0), Color::BLACK)
            .clip(Rect::new(clip_x, 0.0, 10.0, 10.0))
            .into()
    }

    fn tag(call: &DrawCall) -> f32 {
        let DrawCall::Fill(f) = call else { panic!("not a fill") };
        f.placement.position.x
    }

    #[test]
    fn equal_keys_share_a_batch() {
        let mut acc = BatchAccumulator::new();
        acc.add_shape(fill(0.0, 1.0));
        acc.add_shape(fill(5.0, 2.0));
        acc.add_shape(fill(0.0, 3.0));

        assert_eq!(acc.len(), 2);
        assert_eq!(acc.pending_calls(), 3);
        let first: Vec<f32> = acc.batches()[0].members().iter().map(tag).collect();
        assert_eq!(first, [1.0, 3.0]);
    }

    #[test]
    fn drains_most_recent_batch_first() {
        let mut acc = BatchAccumulator::new();
        acc.add_shape(fill(0.0, 1.0));
        acc.add_shape(fill(5.0, 2.0));
        acc.add_shape(fill(9.0, 3.0));

        let drain = acc.drain_next(2).unwrap();
        let order: Vec<(u32, f32)> = drain.calls.iter().map(|d| (d.group, tag(&d.call))).collect();
        assert_eq!(order, [(0, 3.0), (1, 2.0)]);
        assert_eq!(drain.groups(), 2);

        let rest = acc.drain_next(2).unwrap();
        assert_eq!(rest.calls.len(), 1);
        assert_eq!(tag(&rest.calls[0].call), 1.0);
        assert!(acc.drain_next(2).is_none());
    }

    #[test]
    fn drains_respect_group_capacity_and_lose_nothing() {
        let mut acc = BatchAccumulator::new();
        for i in 0..600 {
            acc.add_shape(fill(i as f32, i as f32));
        }
        // A second member for every tenth group.
        for i in (0..600).step_by(10) {
            acc.add_shape(fill(i as f32, 1000.0 + i as f32));
        }
        let expected = acc.pending_instances();
        assert_eq!(expected, 660);

        let mut sizes = Vec::new();
        let mut seen = Vec::new();
        while let Some(drain) = acc.drain_next(256) {
            assert!(drain.groups() <= 256);
            assert_eq!(drain.instance_count, drain.calls.len());
            assert!(drain.calls.iter().all(|d| (d.group as usize) < drain.groups()));
            sizes.push(drain.groups());
            seen.extend(drain.calls.iter().map(|d| tag(&d.call) as i32));
        }
        assert_eq!(sizes, [256, 256, 88]);
        assert_eq!(seen.len(), expected);
        seen.sort_unstable();
        let mut tags: Vec<i32> = (0..600).chain((0..600).step_by(10).map(|i| 1000 + i)).collect();
        tags.sort_unstable();
        assert_eq!(seen, tags);
        assert!(acc.is_empty());
    }

    #[test]
    fn sort_puts_deeper_calls_first_across_groups() {
        let mut acc = BatchAccumulator::new();
        let deep = FillCall::new(Rect::new(1.0, 0.0, 1.0, 1.0), Color::WHITE).depth(0.9);
        let near = FillCall::new(Rect::new(2.0, 0.0, 1.0, 1.0), Color::BLACK)
            .depth(0.1)
            .clip(Rect::new(0.0, 0.0, 5.0, 5.0));
        acc.add_shape(deep.into());
        acc.add_shape(near.into());

        let mut drain = acc.drain_next(8).unwrap();
        // LIFO: the newer, nearer batch comes out first.
        assert_eq!(tag(&drain.calls[0].call), 2.0);

        drain.sort_back_to_front();
        let order: Vec<(u32, f32)> = drain.calls.iter().map(|d| (d.group, tag(&d.call))).collect();
        assert_eq!(order, [(1, 1.0), (0, 2.0)]);
    }

    #[test]
    fn sort_is_stable_at_equal_depth() {
        let mut acc = BatchAccumulator::new();
        acc.add_shape(fill(0.0, 1.0));
        acc.add_shape(fill(5.0, 2.0));
        acc.add_shape(fill(0.0, 3.0));

        let mut drain = acc.drain_next(8).unwrap();
        let before: Vec<f32> = drain.calls.iter().map(|d| tag(&d.call)).collect();
        drain.sort_back_to_front();
        let after: Vec<f32> = drain.calls.iter().map(|d| tag(&d.call)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn uniform_bytes_follow_group_order() {
        let mut acc = BatchAccumulator::new();
        acc.add_shape(fill(0.0, 1.0));
        acc.add_shape(fill(5.0, 2.0));
        let drain = acc.drain_next(8).unwrap();
        let bytes = drain.uniform_bytes();
        assert_eq!(bytes.len(), 2 * GroupKey::block_size(crate::scene::ShapeKind::Fill));
        assert_eq!(&bytes[..drain.keys[0].len()], drain.keys[0].as_bytes());
        // Clip x of the most recent batch comes first.
        assert_eq!(drain.keys[0].clip().map(|c| c[0]), Some(5.0));
    }

    #[test]
    fn text_counts_one_instance_per_char() {
        let mut acc = BatchAccumulator::new();
        acc.add_shape(TextCall::new("Hello", FontId(0), 12.0, Color::BLACK, Vec2::ZERO).into());
        assert_eq!(acc.pending_instances(), 5);
        assert_eq!(acc.drain_next(1).map(|d| d.instance_count), Some(5));
    }

    #[test]
    fn zero_capacity_still_progresses() {
        let mut acc = BatchAccumulator::new();
        acc.add_shape(fill(0.0, 1.0));
        assert_eq!(acc.drain_next(0).map(|d| d.groups()), Some(1));
    }

    #[test]
    fn clear_discards_pending() {
        let mut acc = BatchAccumulator::new();
        acc.add_shape(fill(0.0, 1.0));
        acc.clear();
        assert!(acc.is_empty());
        assert_eq!(acc.pending_instances(), 0);
    }
}
