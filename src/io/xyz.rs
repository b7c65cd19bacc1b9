use crate::core::error::ExtractionError;
use crate::extraction::geometry::{BlockKind, GeometryOutput};
use std::fs;
use std::path::Path;

/// Formats a block as an XYZ file: atom count, comment, one atom per line.
pub fn to_xyz_string(output: &GeometryOutput, comment: &str) -> Result<String, ExtractionError> {
    let atoms = output.block.atoms()?;
    let mut body = String::with_capacity(64 * (atoms.len() + 2));
    body.push_str(&format!("{}\n{}\n", atoms.len(), comment));
    for atom in &atoms {
        body.push_str(&format!(
            "{:<2} {:15.10} {:15.10} {:15.10}\n",
            atom.element, atom.position[0], atom.position[1], atom.position[2]
        ));
    }
    Ok(body)
}

/// Writes the block to its destination, creating the target directory if
/// needed. Existing files are replaced.
pub fn write(output: &GeometryOutput) -> Result<(), ExtractionError> {
    let destination: &Path = &output.destination;
    let failed = |source| ExtractionError::Write {
        path: destination.to_path_buf(),
        source,
    };
    if let Some(dir) = destination.parent() {
        fs::create_dir_all(dir).map_err(failed)?;
    }
    let comment = match output.block.kind {
        BlockKind::Equilibrium => "equilibrium geometry",
        BlockKind::PendingRerun => "last geometry before interruption",
    };
    let body = to_xyz_string(output, comment)?;
    fs::write(destination, body).map_err(failed)
}
