use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::db::SkuRow;
use crate::table::RecordTable;

static RAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9][0-9,]*(?:\.[0-9]+)?)").unwrap());

#[derive(Debug, Error, PartialEq)]
#[error("cannot coerce {value:?} to a number (column {column:?}, row {row})")]
pub struct FieldCoercionError {
    pub column: String,
    pub row: usize,
    pub value: String,
}

/// Map a merged table onto the canonical SKU schema.
///
/// Per row: the CPU count coalesces `vCPU(s)` with `Core`, the surviving
/// columns are projected onto their canonical names, placeholder text
/// becomes absent, GPU and RAM free text is parsed, and the price columns
/// are coerced to numbers. Canonical column names are accepted alongside
/// the source names, so normalizing an already-normalized table changes
/// nothing.
pub fn normalize(merged: &RecordTable) -> Result<Vec<SkuRow>, FieldCoercionError> {
    let mut catalog = Vec::with_capacity(merged.len());

    for row in 0..merged.len() {
        // Coalesce before cleanup: a placeholder in the primary column
        // still wins over the fallback, it just cleans to absent.
        let cpus_raw = merged
            .value(row, "vCPU(s)")
            .or_else(|| merged.value(row, "CPUs"))
            .or_else(|| merged.value(row, "Core"));

        let name = clean(merged.value(row, "Instance").or_else(|| merged.value(row, "Name")));
        let storage = clean(
            merged
                .value(row, "Temporary storage")
                .or_else(|| merged.value(row, "Storage")),
        );
        let ram = clean(merged.value(row, "RAM").or_else(|| merged.value(row, "RAM (GB)")));
        let gpu = clean(merged.value(row, "GPU").or_else(|| merged.value(row, "GPUs")));
        let price = clean(
            merged
                .value(row, "Pay as you go")
                .or_else(|| merged.value(row, "Price ($/hr)")),
        );
        let spot = clean(
            merged
                .value(row, "Spot(% Savings)")
                .or_else(|| merged.value(row, "Spot ($/hr)")),
        );

        let (gpu_count, gpu_name) = parse_gpu(gpu, clean(merged.value(row, "GPU Name")));
        let gpus = gpu_count.unwrap_or(0);
        let gpu_ram_gb = f64::from(gpus) * gpu_name.as_deref().map_or(0.0, gpu_ram_capacity);

        catalog.push(SkuRow {
            name: name.map(str::to_string),
            region: merged.value(row, "Region").unwrap_or_default().to_string(),
            cpus: coerce_number("CPUs", row, clean(cpus_raw))?,
            ram_gb: parse_ram(ram),
            storage: storage.map(str::to_string),
            gpus,
            gpu_name,
            gpu_ram_gb,
            price_hr: coerce_number("Price ($/hr)", row, price)?,
            spot_hr: coerce_number("Spot ($/hr)", row, spot)?,
        });
    }

    Ok(catalog)
}

/// Placeholder cleanup: the provider renders "no data" as empty cells,
/// "N/A", or a templated blank marker. All of them become absent, whatever
/// the column. The pattern set is not guaranteed exhaustive for other
/// locales of the page.
fn clean(value: Option<&str>) -> Option<&str> {
    let v = value?;
    if v.trim().is_empty() || v == "N/A" || v.ends_with("Blank") {
        None
    } else {
        Some(v)
    }
}

/// Parse GPU free text like `"2x V100"` into count and model.
///
/// A bare numeric count (already-normalized input) takes its model from the
/// canonical `GPU Name` column. Malformed text yields absent/absent rather
/// than an error; third-party pricing data is expected to be irregular.
fn parse_gpu(value: Option<&str>, canonical_name: Option<&str>) -> (Option<u32>, Option<String>) {
    let Some(text) = value else {
        return (None, None);
    };
    let tokens: Vec<&str> = text.split_whitespace().collect();
    match tokens.as_slice() {
        [count, model, ..] => {
            let digits = count.trim_end_matches(|c: char| !c.is_ascii_digit());
            match digits.parse() {
                Ok(n) => (Some(n), Some((*model).to_string())),
                Err(_) => (None, None),
            }
        }
        [count] if count.chars().all(|c| c.is_ascii_digit()) => match count.parse() {
            Ok(n) => (Some(n), canonical_name.map(str::to_string)),
            Err(_) => (None, None),
        },
        _ => (None, None),
    }
}

/// Memory in GiB per accelerator model. Unknown models count as zero so the
/// derived GPU RAM column stays numeric.
fn gpu_ram_capacity(model: &str) -> f64 {
    match model {
        "K80" => 12.0,
        "M60" => 8.0,
        "P100" => 16.0,
        "P40" => 24.0,
        "T4" => 16.0,
        "V100" => 16.0,
        "A100" => 40.0,
        _ => 0.0,
    }
}

/// Leading numeric quantity of RAM text like `"16 GiB"` or `"11,400 GiB"`.
/// Absent or non-numeric text defaults to 0.0, keeping the column numeric.
fn parse_ram(value: Option<&str>) -> f64 {
    let Some(text) = value else {
        return 0.0;
    };
    RAM_RE
        .captures(text)
        .and_then(|c| c[1].replace(',', "").parse().ok())
        .unwrap_or(0.0)
}

/// The hard validation gate: absent passes through, anything else must
/// parse as a number once a leading currency symbol and thousands
/// separators are gone.
fn coerce_number(
    column: &str,
    row: usize,
    value: Option<&str>,
) -> Result<Option<f64>, FieldCoercionError> {
    let Some(text) = value else {
        return Ok(None);
    };
    let trimmed = text.trim();
    let bare = trimmed.strip_prefix('$').unwrap_or(trimmed);
    bare.replace(',', "")
        .parse()
        .map(Some)
        .map_err(|_| FieldCoercionError {
            column: column.to_string(),
            row,
            value: text.to_string(),
        })
}

// ── Tests ──
