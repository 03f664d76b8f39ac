//! The flattened record handed to the storage layer, and the trait storage backends
//! implement.
use thiserror::Error;

use crate::spectrum::LibrarySpectrum;

const F64_SIZE: usize = std::mem::size_of::<f64>();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("byte buffer of length {0} is not a whole number of 64-bit floats")]
pub struct BlobDecodeError(pub usize);

/// Encode `values` as a packed little-endian `f64` array
pub fn encode_f64_le(values: &[f64]) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(values.len() * F64_SIZE);
    for value in values {
        buffer.extend_from_slice(&value.to_le_bytes());
    }
    buffer
}

/// Decode a packed little-endian `f64` array
pub fn decode_f64_le(buffer: &[u8]) -> Result<Vec<f64>, BlobDecodeError> {
    if buffer.len() % F64_SIZE != 0 {
        return Err(BlobDecodeError(buffer.len()));
    }
    Ok(buffer
        .chunks_exact(F64_SIZE)
        .map(|chunk| {
            let mut bytes = [0u8; F64_SIZE];
            bytes.copy_from_slice(chunk);
            f64::from_le_bytes(bytes)
        })
        .collect())
}

/// One spectrum, flattened for storage
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SinkRecord {
    pub name: String,
    pub sequence: String,
    pub charge: i32,
    pub precursor_mz: f64,
    pub neutral_mass: f64,
    pub fragmentation_mode: String,
    pub mass_analyzer: String,
    pub instrument: Option<String>,
    pub retention_time: Option<f64>,
    pub collision_energy: Option<f64>,
    pub modification_string: String,
    pub tag: String,
    pub compound_class: String,
    pub mz_blob: Vec<u8>,
    pub intensity_blob: Vec<u8>,
}

impl SinkRecord {
    pub fn from_spectrum(spectrum: &LibrarySpectrum) -> Self {
        let (mzs, intensities): (Vec<f64>, Vec<f64>) =
            spectrum.peaks.iter().map(|p| (p.mz, p.intensity)).unzip();
        Self {
            name: spectrum.name(),
            sequence: spectrum.sequence.clone(),
            charge: spectrum.charge,
            precursor_mz: spectrum.precursor_mz,
            neutral_mass: spectrum.neutral_mass(),
            fragmentation_mode: spectrum.fragmentation_mode.clone(),
            mass_analyzer: spectrum.mass_analyzer.clone(),
            instrument: spectrum.instrument.clone(),
            retention_time: spectrum.retention_time,
            collision_energy: spectrum.collision_energy,
            modification_string: spectrum.modification_string(),
            tag: spectrum.tag(),
            compound_class: spectrum.compound_class.clone(),
            mz_blob: encode_f64_le(&mzs),
            intensity_blob: encode_f64_le(&intensities),
        }
    }

    pub fn mz_array(&self) -> Result<Vec<f64>, BlobDecodeError> {
        decode_f64_le(&self.mz_blob)
    }

    pub fn intensity_array(&self) -> Result<Vec<f64>, BlobDecodeError> {
        decode_f64_le(&self.intensity_blob)
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("An IO error occurred: {0}")]
    IOError(
        #[from]
        #[source]
        std::io::Error,
    ),
    #[error("The sink rejected record {name}: {reason}")]
    Rejected { name: String, reason: String },
    #[error("The sink has already been finalized")]
    Finalized,
}

/// A destination for normalized library records
pub trait LibrarySink {
    fn write_record(&mut self, record: &SinkRecord) -> Result<(), SinkError>;

    /// Flush and close the sink. No records may be written afterwards.
    fn finalize(&mut self) -> Result<(), SinkError>;
}

impl<T: LibrarySink + ?Sized> LibrarySink for &mut T {
    fn write_record(&mut self, record: &SinkRecord) -> Result<(), SinkError> {
        (**self).write_record(record)
    }

    fn finalize(&mut self) -> Result<(), SinkError> {
        (**self).finalize()
    }
}

/// Collects records in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub records: Vec<SinkRecord>,
    finalized: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl LibrarySink for MemorySink {
    fn write_record(&mut self, record: &SinkRecord) -> Result<(), SinkError> {
        if self.finalized {
            return Err(SinkError::Finalized);
        }
        self.records.push(record.clone());
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), SinkError> {
        if self.finalized {
            return Err(SinkError::Finalized);
        }
        self.finalized = true;
        Ok(())
    }
}
