//! Vector to magnitude reduction: `dst[i] = sqrt(sum of squares of components[i])`.

use num_traits::Float;

pub fn magnitude_2d<T: Float>(x: &[T], y: &[T], dst: &mut [T]) {
    debug_assert!(x.len() == dst.len() && y.len() == dst.len());
    for ((out, &x), &y) in dst.iter_mut().zip(x).zip(y) {
        *out = (x * x + y * y).sqrt();
    }
}

pub fn magnitude_3d<T: Float>(x: &[T], y: &[T], z: &[T], dst: &mut [T]) {
    debug_assert!(x.len() == dst.len() && y.len() == dst.len() && z.len() == dst.len());
    for (((out, &x), &y), &z) in dst.iter_mut().zip(x).zip(y).zip(z) {
        *out = (x * x + y * y + z * z).sqrt();
    }
}
