// In: src/dataset/allocator_tests.rs

use super::*;
use crate::config::AllocationConfig;
use crate::error::StepflowError;

fn config() -> AllocationConfig {
    AllocationConfig::new(vec![4, 4], vec![4, 4], vec![16])
}

#[test]
fn test_first_configuration_allocates_everything() {
    let mut ds = Dataset::default();
    let changes = ds.reconfigure(config()).unwrap();
    assert!(changes.timestamp_samples);
    assert!(changes.value_samples);
    assert!(changes.opaque_bytes);
    assert_eq!(ds.timestamps.len(), 8);
    assert_eq!(ds.values.len(), 8);
    assert_eq!(ds.opaque.len(), 2);
}

#[test]
fn test_empty_config_still_allocates_one_element() {
    let ds = Dataset::new(AllocationConfig::default()).unwrap();
    assert_eq!(ds.timestamps.len(), 1);
    assert_eq!(ds.values.len(), 1);
    assert_eq!(ds.opaque.len(), 1);
    assert_eq!(ds.layout().timestamp_axis_count(), 0);
}

#[test]
fn test_unchanged_config_keeps_storage_and_contents() {
    let mut ds = Dataset::new(config()).unwrap();
    let sf = StepFunction1D::new(0, 1);
    ds.set_length(&sf, 3).unwrap();
    ds.values_mut(&sf, 0).unwrap().copy_from_slice(&[1.5, 2.5, 3.5]);
    ds.timestamps_mut(&sf).unwrap().copy_from_slice(&[7, 8, 9]);

    let values_ptr = ds.values.as_ptr();
    let timestamps_ptr = ds.timestamps.as_ptr();
    let opaque_ptr = ds.opaque.as_ptr();

    for _ in 0..2 {
        let changes = ds.reconfigure(config()).unwrap();
        assert_eq!(changes, Reallocations::default());
    }

    assert_eq!(ds.values.as_ptr(), values_ptr);
    assert_eq!(ds.timestamps.as_ptr(), timestamps_ptr);
    assert_eq!(ds.opaque.as_ptr(), opaque_ptr);
    assert_eq!(ds.length(&sf).unwrap(), 3);
    assert_eq!(ds.values_x(&sf).unwrap(), &[1.5, 2.5, 3.5]);
    assert_eq!(ds.timestamps(&sf).unwrap(), &[7, 8, 9]);
}

#[test]
fn test_only_changed_dimension_is_reallocated() {
    let mut ds = Dataset::new(config()).unwrap();
    let timestamps_ptr = ds.timestamps.as_ptr();
    let opaque_ptr = ds.opaque.as_ptr();

    let grown = AllocationConfig::new(vec![4, 4], vec![4, 4, 8], vec![16]);
    let changes = ds.reconfigure(grown).unwrap();
    assert!(changes.value_axis_count);
    assert!(changes.value_samples);
    assert!(!changes.timestamp_samples);
    assert!(!changes.opaque_bytes);
    assert!(changes.any_storage());

    assert_eq!(ds.values.len(), 16);
    assert_eq!(ds.timestamps.as_ptr(), timestamps_ptr);
    assert_eq!(ds.opaque.as_ptr(), opaque_ptr);
}

#[test]
fn test_repartitioned_axes_keep_storage() {
    let mut ds = Dataset::new(config()).unwrap();
    let timestamps_ptr = ds.timestamps.as_ptr();

    // Same total, different split.
    let changes = ds
        .reconfigure(AllocationConfig::new(vec![6, 2], vec![4, 4], vec![16]))
        .unwrap();
    assert!(!changes.timestamp_samples);
    assert!(!changes.timestamp_axis_count);
    assert_eq!(ds.timestamps.as_ptr(), timestamps_ptr);
    assert_eq!(ds.layout().timestamp_offsets, vec![0, 6]);
}

#[test]
fn test_retained_lengths_are_clamped() {
    let mut ds = Dataset::new(config()).unwrap();
    let a = StepFunction1D::new(0, 0);
    let b = StepFunction1D::new(1, 1);
    ds.set_length(&a, 4).unwrap();
    ds.set_length(&b, 2).unwrap();

    // Same timestamp total, one more axis: storage stays, lengths are clamped.
    let changes = ds
        .reconfigure(AllocationConfig::new(vec![3, 4, 1], vec![4, 4], vec![16]))
        .unwrap();
    assert!(!changes.any_storage());
    assert_eq!(ds.length(&a).unwrap(), 3);
    assert_eq!(ds.length(&b).unwrap(), 2);
    assert_eq!(ds.length(&StepFunction1D::new(2, 0)).unwrap(), 0);
}

#[test]
fn test_reallocation_empties_every_axis() {
    let mut ds = Dataset::new(config()).unwrap();
    let a = StepFunction1D::new(0, 0);
    let b = StepFunction1D::new(1, 1);
    ds.set_length(&a, 2).unwrap();
    ds.set_length(&b, 3).unwrap();
    ds.values_mut(&a, 0).unwrap().copy_from_slice(&[1.0, 2.0]);

    // Only the value column changes size, but no axis keeps stale samples.
    let changes = ds
        .reconfigure(AllocationConfig::new(vec![4, 4], vec![4, 8], vec![16]))
        .unwrap();
    assert!(changes.value_samples);
    assert!(!changes.timestamp_samples);
    assert_eq!(ds.length(&a).unwrap(), 0);
    assert_eq!(ds.length(&b).unwrap(), 0);
    assert!(ds.values_x(&a).unwrap().is_empty());
}

#[test]
fn test_removed_axes_become_out_of_range() {
    let mut ds = Dataset::new(config()).unwrap();
    ds.reconfigure(AllocationConfig::new(vec![8], vec![8], vec![16]))
        .unwrap();
    assert!(matches!(
        ds.length(&StepFunction1D::new(1, 0)),
        Err(StepflowError::AxisOutOfRange { axis: 1, count: 1, .. })
    ));
}
