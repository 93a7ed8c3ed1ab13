//! Prefix sum: `acc = 0; for i: acc += src[i]; dst[i] = acc`.

use num_traits::Zero;
use std::ops::Add;

pub fn prefix_sum<T>(src: &[T], dst: &mut [T])
where
    T: Copy + Zero + Add<Output = T>,
{
    debug_assert_eq!(src.len(), dst.len());
    let mut acc = T::zero();
    for (out, &v) in dst.iter_mut().zip(src) {
        acc = acc + v;
        *out = acc;
    }
}

pub fn prefix_sum_in_place<T>(values: &mut [T])
where
    T: Copy + Zero + Add<Output = T>,
{
    let mut acc = T::zero();
    for v in values.iter_mut() {
        acc = acc + *v;
        *v = acc;
    }
}
