//! Schema command - print expected input formats

use crate::tax::regime::RawRegime;
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for one regime in the dataset
    JsonSchema,
    /// CSV header row for the percentile source file
    CsvHeader,
    /// CSV column descriptions for the percentile source file
    CsvFields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => self.print_json_schema(),
            SchemaFormat::CsvHeader => self.print_csv_header(),
            SchemaFormat::CsvFields => self.print_csv_fields(),
        }
    }

    fn print_json_schema(&self) -> anyhow::Result<()> {
        let schema = schema_for!(RawRegime);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }

    fn print_csv_header(&self) -> anyhow::Result<()> {
        println!("{}", CSV_COLUMNS.join(","));
        Ok(())
    }

    fn print_csv_fields(&self) -> anyhow::Result<()> {
        println!("Percentile CSV Input Format");
        println!("===========================");
        println!();
        for (name, required, description) in CSV_FIELD_DESCRIPTIONS {
            let req = if *required { "required" } else { "optional" };
            println!("{:16} ({:8})  {}", name, req, description);
        }
        println!();
        println!("Incomes are pre-uprating; the delta command applies wage growth.");
        Ok(())
    }
}

const CSV_COLUMNS: &[&str] = &["percentile", "gross_income"];

const CSV_FIELD_DESCRIPTIONS: &[(&str, bool, &str)] = &[
    ("percentile", true, "Percentile rank of the income distribution"),
    (
        "gross_income",
        true,
        "Pre-tax income at that percentile, before wage growth",
    ),
];
