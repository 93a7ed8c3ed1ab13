// In: src/pipeline/demuxer.rs

//! Change-triggered bit-field demultiplexer.
//!
//! Raw device state arrives as fixed-width snapshots of 64-bit words, each with a
//! timestamp. The demuxer keeps the previous snapshot, XORs every new one against
//! it and, for each configured field whose bits changed, appends one sample
//! (snapshot timestamp + converted field value) to that field's output step
//! function. Unchanged fields emit nothing, so outputs are sparse event streams.
//!
//! The very first snapshot is diffed against its own bitwise complement, which
//! makes every field emit once.

use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, OpaqueStepFunction, ResizableBuffer, StepFunction, StepFunction1D, StepFunctionInt};
use crate::error::{AxisKind, StepflowError};
use crate::kernels::demux::{self, BitField, DestinationEncoding, FieldValue, SourceEncoding};

//==================================================================================
// 1. Definitions
//==================================================================================

/// Output step function of a field; the variant fixes the destination encoding.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DemuxTarget {
    /// Float32 samples on a 1D step function.
    Float(StepFunction1D),
    /// Signed 32-bit samples on an int step function.
    Int(StepFunctionInt),
}

impl DemuxTarget {
    pub fn destination_encoding(&self) -> DestinationEncoding {
        match self {
            DemuxTarget::Float(_) => DestinationEncoding::Float32,
            DemuxTarget::Int(_) => DestinationEncoding::SignedBits,
        }
    }

    pub fn timestamps_axis(&self) -> usize {
        match self {
            DemuxTarget::Float(sf) => sf.timestamps_axis(),
            DemuxTarget::Int(sf) => sf.timestamps_axis(),
        }
    }

    /// The value or opaque axis the samples land on.
    pub fn storage_axis(&self) -> (AxisKind, usize) {
        match self {
            DemuxTarget::Float(sf) => (AxisKind::Values, sf.values_x),
            DemuxTarget::Int(sf) => (AxisKind::Opaque, sf.opaque_values),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemuxField {
    pub bits: BitField,
    pub source: SourceEncoding,
    pub target: DemuxTarget,
}

/// Snapshot width plus the field table of one demuxer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DemuxDefinition {
    /// Words per snapshot.
    pub snapshot_words: usize,
    pub fields: Vec<DemuxField>,
}

impl DemuxDefinition {
    pub fn validate(&self) -> Result<(), StepflowError> {
        if self.snapshot_words == 0 {
            return Err(StepflowError::InvalidDescriptor(
                "demux snapshots must hold at least one word".to_string(),
            ));
        }
        for (i, field) in self.fields.iter().enumerate() {
            if field.bits.words_required() > self.snapshot_words {
                return Err(StepflowError::InvalidDescriptor(format!(
                    "demux field {} reads word {} of a {}-word snapshot",
                    i,
                    field.bits.words_required() - 1,
                    self.snapshot_words
                )));
            }
            if field.bits.shift_a >= 64 || field.bits.shift_b >= 64 {
                return Err(StepflowError::InvalidDescriptor(format!(
                    "demux field {} shifts by 64 bits or more",
                    i
                )));
            }
            let earlier = &self.fields[..i];
            let axis = field.target.timestamps_axis();
            if earlier.iter().any(|f| f.target.timestamps_axis() == axis) {
                return Err(StepflowError::AxisAliasing {
                    operator: Demuxer::NAME,
                    detail: format!("field {} writes timestamp axis {} of an earlier field", i, axis),
                });
            }
            let (kind, axis) = field.target.storage_axis();
            if earlier.iter().any(|f| f.target.storage_axis() == (kind, axis)) {
                return Err(StepflowError::AxisAliasing {
                    operator: Demuxer::NAME,
                    detail: format!("field {} writes {} axis {} of an earlier field", i, kind, axis),
                });
            }
        }
        Ok(())
    }
}

//==================================================================================
// 2. Demuxer
//==================================================================================

#[derive(Debug, Clone)]
pub struct Demuxer {
    definition: DemuxDefinition,
    /// Staged snapshots, each `[timestamp, word 0, .., word n-1]`.
    staged: ResizableBuffer<u64>,
    previous: Vec<u64>,
    /// Copy of `previous` taken at the start of a run, restored if the run fails.
    checkpoint: Vec<u64>,
    changed: Vec<u64>,
    primed: bool,
}

impl Demuxer {
    pub const NAME: &'static str = "demux";

    pub fn new(definition: DemuxDefinition) -> Result<Self, StepflowError> {
        definition.validate()?;
        let words = definition.snapshot_words;
        Ok(Self {
            definition,
            staged: ResizableBuffer::new(),
            previous: vec![0; words],
            checkpoint: vec![0; words],
            changed: vec![0; words],
            primed: false,
        })
    }

    pub fn definition(&self) -> &DemuxDefinition {
        &self.definition
    }

    /// Number of snapshots waiting for the next run.
    pub fn staged_snapshots(&self) -> usize {
        self.staged.len() / (self.definition.snapshot_words + 1)
    }

    /// Queues one snapshot for the next run.
    pub fn push_snapshot(&mut self, timestamp: u64, words: &[u64]) -> Result<(), StepflowError> {
        if words.len() != self.definition.snapshot_words {
            return Err(StepflowError::SnapshotShape {
                expected: self.definition.snapshot_words,
                actual: words.len(),
            });
        }
        self.staged.extend_from_slice(&[timestamp])?;
        self.staged.extend_from_slice(words)
    }

    /// Forgets the previous state; the next snapshot is treated as the first one.
    pub fn reset(&mut self) {
        self.primed = false;
        self.staged.clear();
    }

    /// Demultiplexes every staged snapshot into the field outputs and drains the stage.
    ///
    /// Output lengths restart from zero on every run. Returns the number of samples
    /// emitted over all fields. On error the stage and the previous state are left
    /// as they were before the run, so the same snapshots can be replayed once the
    /// dataset has room for them.
    pub fn run(&mut self, dataset: &mut Dataset) -> Result<usize, StepflowError> {
        let primed = self.primed;
        self.checkpoint.copy_from_slice(&self.previous);

        match self.demux_staged(dataset) {
            Ok(emitted) => {
                self.staged.clear();
                log::debug!(
                    "demux: {} fields, emitted {} samples",
                    self.definition.fields.len(),
                    emitted
                );
                Ok(emitted)
            }
            Err(e) => {
                self.previous.copy_from_slice(&self.checkpoint);
                self.primed = primed;
                Err(e)
            }
        }
    }

    fn demux_staged(&mut self, dataset: &mut Dataset) -> Result<usize, StepflowError> {
        let Self {
            definition,
            staged,
            previous,
            changed,
            primed,
            ..
        } = self;

        for field in &definition.fields {
            match &field.target {
                DemuxTarget::Float(sf) => dataset.set_length(sf, 0)?,
                DemuxTarget::Int(sf) => dataset.set_length(sf, 0)?,
            }
        }

        let mut emitted = 0;
        for record in staged.as_slice().chunks_exact(definition.snapshot_words + 1) {
            let (timestamp, snapshot) = (record[0], &record[1..]);
            if !*primed {
                for (p, &s) in previous.iter_mut().zip(snapshot) {
                    *p = !s;
                }
                *primed = true;
            }
            demux::diff_words(snapshot, previous, changed);

            for field in &definition.fields {
                if !field.bits.is_changed(&changed[..]) {
                    continue;
                }
                let raw = field.bits.extract(snapshot);
                let value = demux::convert(
                    raw,
                    field.bits.width(),
                    field.source,
                    field.target.destination_encoding(),
                );
                append(dataset, &field.target, timestamp, value)?;
                emitted += 1;
            }
        }
        Ok(emitted)
    }
}

/// Appends one sample to a field output, advancing its length by one.
///
/// Every region is resolved before anything is written, so a full output keeps
/// its length and contents.
fn append(dataset: &mut Dataset, target: &DemuxTarget, timestamp: u64, value: FieldValue) -> Result<(), StepflowError> {
    let (layout, columns) = dataset.parts_mut();
    let axis = target.timestamps_axis();
    let len = layout.length(axis)? + 1;
    let timestamps = layout.timestamp_region(axis, len)?;

    match (target, value) {
        (DemuxTarget::Float(sf), FieldValue::Float(v)) => {
            let values = layout.value_region(sf.values_x, len)?;
            columns.values[values.end - 1] = v;
        }
        (DemuxTarget::Int(sf), FieldValue::Int(v)) => {
            let bytes = layout.opaque_region(sf.opaque_values, len, sf.value_stride())?;
            columns.opaque[bytes.end - sf.value_stride()..bytes.end].copy_from_slice(&v.to_ne_bytes());
        }
        (target, value) => {
            return Err(StepflowError::InvalidDescriptor(format!(
                "demux value {:?} does not match target {:?}",
                value, target
            )))
        }
    }
    columns.timestamps[timestamps.end - 1] = timestamp;
    layout.set_length(axis, len)
}
