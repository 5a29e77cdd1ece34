//! HDF5 superblock signature checks.
//!
//! Statepoints and h5m containers are HDF5 files. The harness only needs to
//! know a file is structurally an HDF5 container, which the superblock
//! signature answers without linking libhdf5.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::traits::MeshValidator;
use crate::types::ConversionError;

/// The 8-byte HDF5 format signature.
pub const HDF5_SIGNATURE: [u8; 8] = [0x89, b'H', b'D', b'F', b'\r', b'\n', 0x1a, b'\n'];

/// Whether the file carries the HDF5 signature at offset 0, 512, 1024, 2048, ...
pub fn has_hdf5_signature(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    let mut offset = 0u64;
    let mut buf = [0u8; 8];

    while offset + 8 <= len {
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut buf)?;
        if buf == HDF5_SIGNATURE {
            return Ok(true);
        }
        offset = if offset == 0 { 512 } else { offset * 2 };
    }
    Ok(false)
}

/// Write `payload` behind an HDF5 signature. Used by the mocks as a stand-in
/// for real HDF5 output.
pub fn write_stamped(path: &Path, payload: &[u8]) -> io::Result<()> {
    let mut bytes = Vec::with_capacity(HDF5_SIGNATURE.len() + payload.len());
    bytes.extend_from_slice(&HDF5_SIGNATURE);
    bytes.extend_from_slice(payload);
    fs::write(path, bytes)
}

/// Read back a payload written by [`write_stamped`].
pub fn read_stamped(path: &Path) -> io::Result<Vec<u8>> {
    let bytes = fs::read(path)?;
    if bytes.len() < HDF5_SIGNATURE.len() || bytes[..HDF5_SIGNATURE.len()] != HDF5_SIGNATURE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "missing HDF5 signature",
        ));
    }
    Ok(bytes[HDF5_SIGNATURE.len()..].to_vec())
}

/// Accepts a mesh container iff it is a non-empty HDF5 file.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hdf5SignatureValidator;

impl MeshValidator for Hdf5SignatureValidator {
    fn validate(&self, path: &Path) -> Result<bool, ConversionError> {
        has_hdf5_signature(path).map_err(|source| ConversionError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
