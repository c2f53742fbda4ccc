use crate::domain::{AbinsError, AbinsResult};
use crate::modules::serialization::{format_fixed_f64, format_scientific_f64, write_text_artifact};
use crate::modules::structure_factor::StructureFactorResult;
use std::path::{Path, PathBuf};
use tracing::debug;

const FREQUENCY_WIDTH: usize = 14;
const FREQUENCY_PRECISION: usize = 5;
const INTENSITY_WIDTH: usize = 18;
const INTENSITY_PRECISION: usize = 9;

/// Columnar table for one atom: frequency, every overtone, then the total.
pub fn render_spectrum_table(
    result: &StructureFactorResult,
    atom_index: usize,
) -> AbinsResult<String> {
    let atom = result.atoms().get(atom_index).ok_or_else(|| {
        AbinsError::structural(
            "INPUT.ATOM_INDEX",
            format!(
                "atom index {} is out of range for {} atoms",
                atom_index,
                result.num_atoms()
            ),
        )
    })?;

    let overtones = atom.overtone_count();
    let mut table = format!(
        "# atom {} symbol {} sort {} temperature {} sample_form {}\n",
        atom_index,
        atom.symbol(),
        atom.sort(),
        result.temperature().kelvin(),
        result.sample_form()
    );
    table.push_str("# frequency");
    for n in 0..overtones {
        table.push_str(&format!(" order_{}", n + 1));
    }
    table.push_str(" total\n");

    let value = atom.value();
    for (point, frequency) in result.frequencies().iter().copied().enumerate() {
        table.push_str(&format_fixed_f64(frequency, FREQUENCY_WIDTH, FREQUENCY_PRECISION));
        for column in 0..=overtones {
            table.push_str(&format_scientific_f64(
                value[(point, column)],
                INTENSITY_WIDTH,
                INTENSITY_PRECISION,
            ));
        }
        table.push('\n');
    }
    Ok(table)
}

/// Writes `<index>_<symbol>.dat` for every atom and returns the paths.
pub fn write_spectra(
    result: &StructureFactorResult,
    output_dir: &Path,
) -> AbinsResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(result.num_atoms());
    for (index, atom) in result.atoms().iter().enumerate() {
        let path = output_dir.join(format!("{}_{}.dat", index, file_stem(atom.symbol())));
        let table = render_spectrum_table(result, index)?;
        write_text_artifact(&path, &table).map_err(|source| {
            AbinsError::io_system(
                "IO.EXPORT_WRITE",
                format!("failed to write '{}': {}", path.display(), source),
            )
        })?;
        debug!(path = %path.display(), "wrote spectrum table");
        written.push(path);
    }
    Ok(written)
}

/// Symbol reduced to `[A-Za-z0-9_-]` so the file always lands in the output directory.
fn file_stem(symbol: &str) -> String {
    let stem: String = symbol
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "atom".to_string()
    } else {
        stem
    }
}
