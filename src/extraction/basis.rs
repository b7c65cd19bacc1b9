use crate::core::error::ExtractionError;

/// GAMESS internal basis codes and their canonical names.
const BASIS_TABLE: &[(&str, &str)] = &[
    ("CCD", "cc-pVDZ"),
    ("CCT", "cc-pVTZ"),
    ("CCQ", "cc-pVQZ"),
    ("aCCD", "aug-cc-pVDZ"),
    ("aCCT", "aug-cc-pVTZ"),
    ("aCCQ", "aug-cc-pVQZ"),
];

pub struct BasisResolver;

impl BasisResolver {
    /// Reads the `$BASIS` input card echo, e.g.
    ///
    /// ```text
    ///  INPUT CARD> $BASIS GBASIS=CCT $END
    /// ```
    pub fn resolve<'a, I>(lines: I, file: &str) -> Result<String, ExtractionError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let (index, line) = lines
            .into_iter()
            .enumerate()
            .find(|(_, line)| line.contains("INPUT CARD> $BASIS"))
            .ok_or_else(|| ExtractionError::MissingBasis { file: file.to_string() })?;

        let assignments: Vec<(&str, &str)> = line
            .split_whitespace()
            .filter_map(|token| token.split_once('='))
            .collect();
        let code = assignments
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("GBASIS"))
            .or_else(|| assignments.last())
            .map(|(_, value)| *value)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ExtractionError::parse(file, index + 1, line.trim()))?;

        Ok(Self::canonical(code).to_string())
    }

    /// Unmapped codes are already valid basis names (e.g. `N31`, `STO`).
    pub fn canonical(code: &str) -> &str {
        BASIS_TABLE
            .iter()
            .find(|(raw, _)| *raw == code)
            .map(|(_, name)| *name)
            .unwrap_or(code)
    }
}
