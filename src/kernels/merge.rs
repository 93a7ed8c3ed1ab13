//! Two-way "latest" merge of timestamped streams.
//!
//! Both inputs must be ascending by timestamp. The output holds every sample of
//! both inputs (`l1 + l2`, no deduplication) in ascending order. On equal
//! timestamps the sample of the first stream is emitted first, so the merge is
//! stable.

/// Merges `(t1, v1)` and `(t2, v2)` into `(out_t, out_v)`.
pub fn merge_latest<V: Copy>(
    t1: &[u64],
    v1: &[V],
    t2: &[u64],
    v2: &[V],
    out_t: &mut [u64],
    out_v: &mut [V],
) {
    debug_assert_eq!(t1.len(), v1.len());
    debug_assert_eq!(t2.len(), v2.len());
    debug_assert_eq!(out_t.len(), t1.len() + t2.len());
    debug_assert_eq!(out_v.len(), out_t.len());

    let (mut i1, mut i2) = (0, 0);
    for (t, v) in out_t.iter_mut().zip(out_v.iter_mut()) {
        let take_first = i2 >= t2.len() || (i1 < t1.len() && t1[i1] <= t2[i2]);
        if take_first {
            *t = t1[i1];
            *v = v1[i1];
            i1 += 1;
        } else {
            *t = t2[i2];
            *v = v2[i2];
            i2 += 1;
        }
    }
}
