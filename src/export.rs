// 📤 Export - comma-separated report of the displayed (filtered) records

use crate::classifier::DisplayRecord;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Column layout of the exported report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportLayout {
    /// CPF,Valido,Regiao,Status_Receita
    #[default]
    Registry,
    /// Original,Formatado,Valido,Regiao
    PersonRecord,
}

impl ExportLayout {
    pub fn header(&self) -> &'static str {
        match self {
            ExportLayout::Registry => "CPF,Valido,Regiao,Status_Receita",
            ExportLayout::PersonRecord => "Original,Formatado,Valido,Regiao",
        }
    }

    /// Default download name
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportLayout::Registry => "cpfs_export.csv",
            ExportLayout::PersonRecord => "resultado_cpfs.csv",
        }
    }

    fn row(&self, d: &DisplayRecord) -> String {
        let flag = if d.record.is_valid { "SIM" } else { "NAO" };

        // Region is quoted, nothing else is escaped
        match self {
            ExportLayout::Registry => format!(
                "{},{},\"{}\",{}",
                d.formatted_id_number,
                flag,
                d.record.region.as_deref().unwrap_or(""),
                d.record.registry_status.as_wire()
            ),
            ExportLayout::PersonRecord => format!(
                "{},{},{},\"{}\"",
                d.record.id_number,
                d.formatted_id_number,
                flag,
                d.record.region.as_deref().unwrap_or("-")
            ),
        }
    }
}

impl FromStr for ExportLayout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "registry" => Ok(ExportLayout::Registry),
            "person" | "person_record" | "person-record" => Ok(ExportLayout::PersonRecord),
            other => Err(format!(
                "unknown export layout '{}': expected registry or person",
                other
            )),
        }
    }
}

/// Header plus one row per record, rows separated by '\n'
pub fn render_csv(records: &[DisplayRecord], layout: ExportLayout) -> String {
    std::iter::once(layout.header().to_string())
        .chain(records.iter().map(|d| layout.row(d)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write the report to `path`
pub fn write_csv(path: &Path, records: &[DisplayRecord], layout: ExportLayout) -> Result<()> {
    std::fs::write(path, render_csv(records, layout))
        .with_context(|| format!("Failed to write export file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{classify, Filter};
    use crate::records::{RegistryStatus, ValidatedRecord};
    use pretty_assertions::assert_eq;

    fn display(id_number: &str, status: RegistryStatus) -> Vec<DisplayRecord> {
        let mut r = ValidatedRecord::from_id_number(id_number.to_string());
        r.registry_status = status;
        classify(&[r], Filter::All)
    }

    #[test]
    fn test_registry_layout() {
        let mut records = display("06819885253", RegistryStatus::Regular);
        records.extend(display("12345678900", RegistryStatus::Error));

        assert_eq!(
            render_csv(&records, ExportLayout::Registry),
            "CPF,Valido,Regiao,Status_Receita\n\
             068.198.852-53,SIM,\"AC, AM, AP, PA, RO, RR\",REGULAR\n\
             12345678900,NAO,\"\",ERROR"
        );
    }

    #[test]
    fn test_person_layout() {
        let mut records = display("06819885253", RegistryStatus::Suspended);
        records.extend(display("123", RegistryStatus::Error));

        assert_eq!(
            render_csv(&records, ExportLayout::PersonRecord),
            "Original,Formatado,Valido,Regiao\n\
             06819885253,068.198.852-53,SIM,\"AC, AM, AP, PA, RO, RR\"\n\
             123,123,NAO,\"-\""
        );
    }

    #[test]
    fn test_empty_is_header_only() {
        assert_eq!(render_csv(&[], ExportLayout::Registry), "CPF,Valido,Regiao,Status_Receita");
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ExportLayout::Registry.file_name());
        let records = display("06819885253", RegistryStatus::Pending);

        write_csv(&path, &records, ExportLayout::Registry).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.ends_with("PENDING"));
    }

    #[test]
    fn test_layout_parse() {
        assert_eq!("person".parse::<ExportLayout>(), Ok(ExportLayout::PersonRecord));
        assert_eq!("Registry".parse::<ExportLayout>(), Ok(ExportLayout::Registry));
        assert!("xml".parse::<ExportLayout>().is_err());
    }
}
