use alloy_primitives::{Address, B256, U256};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;

use crate::error::{AllocationError, AllocationResult};
use crate::merkle_tree::leaf_hash;

/// Linear vesting with a cliff. All values are unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VestingSchedule {
    pub start_time: u64,
    pub cliff_duration: u64,
    pub total_duration: u64,
}

impl VestingSchedule {
    pub fn new(start_time: u64, cliff_duration: u64, total_duration: u64) -> Self {
        VestingSchedule {
            start_time,
            cliff_duration,
            total_duration,
        }
    }

    pub fn validate(&self, address: &Address) -> AllocationResult<()> {
        let invalid = |reason: String| AllocationError::InvalidVestingConfig {
            address: address.to_string(),
            reason,
        };

        if self.total_duration == 0 {
            return Err(invalid("total duration must be greater than zero".to_string()));
        }
        if self.cliff_duration > self.total_duration {
            return Err(invalid(format!(
                "cliff duration {} exceeds total duration {}",
                self.cliff_duration, self.total_duration
            )));
        }
        if self.start_time.checked_add(self.total_duration).is_none() {
            return Err(invalid("schedule end overflows".to_string()));
        }
        Ok(())
    }

    pub fn cliff_ends_at(&self) -> u64 {
        self.start_time.saturating_add(self.cliff_duration)
    }

    pub fn ends_at(&self) -> u64 {
        self.start_time.saturating_add(self.total_duration)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitelistEntry {
    pub address: Address,
    pub amount: U256,
    pub tier: String,
    pub reason: String,
    pub vesting: Option<VestingSchedule>,
}

impl WhitelistEntry {
    pub fn new(address: Address, amount: U256) -> Self {
        WhitelistEntry {
            address,
            amount,
            tier: String::new(),
            reason: String::new(),
            vesting: None,
        }
    }

    pub fn with_labels(mut self, tier: impl Into<String>, reason: impl Into<String>) -> Self {
        self.tier = tier.into();
        self.reason = reason.into();
        self
    }

    pub fn with_vesting(mut self, vesting: VestingSchedule) -> Self {
        self.vesting = Some(vesting);
        self
    }

    pub fn leaf(&self) -> B256 {
        leaf_hash(&self.address, &self.amount)
    }
}

/// Entry shape of `whitelist.json`.
#[derive(Debug, Deserialize)]
struct JsonRow {
    address: String,
    amount: String,
    #[serde(default)]
    tier: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    vesting: Option<VestingSchedule>,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    address: String,
    amount: String,
    #[serde(default)]
    tier: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    start_time: Option<u64>,
    #[serde(default)]
    cliff_duration: Option<u64>,
    #[serde(default)]
    total_duration: Option<u64>,
}

impl CsvRow {
    fn vesting(&self, row: usize) -> AllocationResult<Option<VestingSchedule>> {
        match (self.start_time, self.cliff_duration, self.total_duration) {
            (None, None, None) => Ok(None),
            (Some(start), Some(cliff), Some(total)) => {
                Ok(Some(VestingSchedule::new(start, cliff, total)))
            }
            _ => Err(AllocationError::InvalidVestingConfig {
                address: self.address.clone(),
                reason: format!("incomplete vesting columns at row {}", row),
            }),
        }
    }
}

pub fn parse_address(value: &str) -> AllocationResult<Address> {
    let trimmed = value.trim();
    let address: Address = trimmed
        .parse()
        .map_err(|_| AllocationError::InvalidAddress(trimmed.to_string()))?;

    if address == Address::ZERO {
        return Err(AllocationError::InvalidAddress(format!(
            "zero address not allowed: {}",
            trimmed
        )));
    }

    Ok(address)
}

pub fn parse_amount(address: &str, value: &str) -> AllocationResult<U256> {
    let trimmed = value.trim();
    let invalid = || AllocationError::InvalidAmount {
        address: address.trim().to_string(),
        value: trimmed.to_string(),
    };

    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    U256::from_str_radix(trimmed, 10).map_err(|_| invalid())
}

/// Immutable, validated airdrop whitelist with case-insensitive address lookup.
#[derive(Debug, Clone)]
pub struct Whitelist {
    entries: Vec<WhitelistEntry>,
    index: HashMap<Address, usize>,
}

impl Whitelist {
    pub fn from_entries(entries: Vec<WhitelistEntry>) -> AllocationResult<Self> {
        if entries.is_empty() {
            return Err(AllocationError::EmptyWhitelist);
        }

        let mut index = HashMap::with_capacity(entries.len());

        for (position, entry) in entries.iter().enumerate() {
            if entry.address == Address::ZERO {
                return Err(AllocationError::InvalidAddress(format!(
                    "zero address not allowed at entry {}",
                    position
                )));
            }

            if let Some(vesting) = &entry.vesting {
                vesting.validate(&entry.address)?;
            }

            if index.insert(entry.address, position).is_some() {
                return Err(AllocationError::DuplicateAddress(entry.address.to_string()));
            }
        }

        Ok(Whitelist { entries, index })
    }

    pub fn from_json_str(json: &str) -> AllocationResult<Self> {
        let rows: Vec<JsonRow> = serde_json::from_str(json)?;
        Self::from_json_rows(rows)
    }

    fn from_json_rows(rows: Vec<JsonRow>) -> AllocationResult<Self> {
        let entries = rows
            .into_iter()
            .map(|row| {
                let address = parse_address(&row.address)?;
                let amount = parse_amount(&row.address, &row.amount)?;
                Ok(WhitelistEntry {
                    address,
                    amount,
                    tier: row.tier,
                    reason: row.reason,
                    vesting: row.vesting,
                })
            })
            .collect::<AllocationResult<Vec<_>>>()?;

        Self::from_entries(entries)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> AllocationResult<Self> {
        let file = File::open(path.as_ref())?;
        let rows: Vec<JsonRow> = serde_json::from_reader(BufReader::new(file))?;

        let whitelist = Self::from_json_rows(rows)?;
        info!(
            "Loaded {} whitelist entries from {:?}",
            whitelist.len(),
            path.as_ref()
        );
        Ok(whitelist)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> AllocationResult<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries = Vec::new();

        for (row, result) in csv_reader.deserialize().enumerate() {
            let record: CsvRow = result?;

            let address = parse_address(&record.address)?;
            let amount = parse_amount(&record.address, &record.amount)?;
            let vesting = record.vesting(row + 1)?;

            entries.push(WhitelistEntry {
                address,
                amount,
                tier: record.tier,
                reason: record.reason,
                vesting,
            });
        }

        Self::from_entries(entries)
    }

    pub fn from_csv_file<P: AsRef<Path>>(path: P) -> AllocationResult<Self> {
        let file = File::open(path.as_ref())?;
        let whitelist = Self::from_csv_reader(BufReader::new(file))?;
        info!(
            "Loaded {} whitelist entries from {:?}",
            whitelist.len(),
            path.as_ref()
        );
        Ok(whitelist)
    }

    /// Load by file extension: `.json` or `.csv`.
    pub fn load<P: AsRef<Path>>(path: P) -> AllocationResult<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("json") => Self::from_json_file(path),
            Some("csv") => Self::from_csv_file(path),
            _ => Err(AllocationError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn get(&self, address: &Address) -> Option<&WhitelistEntry> {
        self.index.get(address).map(|&position| &self.entries[position])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WhitelistEntry> {
        self.entries.iter()
    }

    /// Sum of all allocations, i.e. the size of the airdrop pool.
    pub fn total_amount(&self) -> U256 {
        self.entries
            .iter()
            .fold(U256::ZERO, |total, entry| total.saturating_add(entry.amount))
    }
}
