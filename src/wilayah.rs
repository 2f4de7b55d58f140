//! Parsing and bulk import of the Kemendagri administrative division dump.
//!
//! The dump is a flat SQL-ish text file of `('code', 'name')` tuples. The code
//! length decides the level: `11` province, `11.01` city, `11.01.01` district,
//! `11.01.01.2001` village. Parent ids are materialized here, once, so nothing
//! downstream re-derives the hierarchy from string prefixes.

use std::sync::LazyLock;

use regex::Regex;
use sqlx::{PgConnection, Postgres, QueryBuilder, query_builder::Separated};

use crate::{
    db::DbPool,
    entity::{cities::CityType, villages::VillageType},
};

pub const DEFAULT_BATCH_SIZE: usize = 1000;

const PROVINCE_CODE_LEN: usize = 2;
const CITY_CODE_LEN: usize = 5;
const DISTRICT_CODE_LEN: usize = 8;
const VILLAGE_CODE_LEN: usize = 13;

/// Kota codes are allocated from 71 upward inside a province.
const FIRST_CITY_SEQUENCE: u32 = 71;

static TUPLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(\s*'([0-9.]+)'\s*,\s*'((?:[^'\\]|\\.|'')*)'\s*\)").expect("valid tuple regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvinceRow {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityRow {
    pub id: String,
    pub province_id: String,
    pub name: String,
    pub city_type: CityType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistrictRow {
    pub id: String,
    pub city_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VillageRow {
    pub id: String,
    pub district_id: String,
    pub name: String,
    pub village_type: VillageType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdministrativeUnit {
    Province(ProvinceRow),
    City(CityRow),
    District(DistrictRow),
    Village(VillageRow),
}

impl AdministrativeUnit {
    pub fn id(&self) -> &str {
        match self {
            AdministrativeUnit::Province(p) => &p.id,
            AdministrativeUnit::City(c) => &c.id,
            AdministrativeUnit::District(d) => &d.id,
            AdministrativeUnit::Village(v) => &v.id,
        }
    }

    pub fn parent_id(&self) -> Option<&str> {
        match self {
            AdministrativeUnit::Province(_) => None,
            AdministrativeUnit::City(c) => Some(&c.province_id),
            AdministrativeUnit::District(d) => Some(&d.city_id),
            AdministrativeUnit::Village(v) => Some(&v.district_id),
        }
    }
}

/// Classify one `(code, name)` tuple. Codes of any other length yield `None`.
pub fn classify(code: &str, name: &str) -> Option<AdministrativeUnit> {
    if !code.is_ascii() {
        return None;
    }
    let name = name.trim().to_string();
    let id = code.to_string();

    let unit = match code.len() {
        PROVINCE_CODE_LEN => AdministrativeUnit::Province(ProvinceRow { id, name }),
        CITY_CODE_LEN => AdministrativeUnit::City(CityRow {
            province_id: code[..PROVINCE_CODE_LEN].to_string(),
            city_type: city_type_for(code),
            id,
            name,
        }),
        DISTRICT_CODE_LEN => AdministrativeUnit::District(DistrictRow {
            city_id: code[..CITY_CODE_LEN].to_string(),
            id,
            name,
        }),
        VILLAGE_CODE_LEN => AdministrativeUnit::Village(VillageRow {
            district_id: code[..DISTRICT_CODE_LEN].to_string(),
            village_type: village_type_for(code),
            id,
            name,
        }),
        _ => return None,
    };
    Some(unit)
}

/// `11.71` is a kota, `11.70` a kabupaten.
pub fn city_type_for(code: &str) -> CityType {
    let sequence = code.get(3..5).and_then(|s| s.parse::<u32>().ok());
    match sequence {
        Some(seq) if seq >= FIRST_CITY_SEQUENCE => CityType::City,
        _ => CityType::Regency,
    }
}

/// The first digit of the village sequence: `1` kelurahan, `2` desa.
pub fn village_type_for(code: &str) -> VillageType {
    match code.as_bytes().get(9) {
        Some(b'1') => VillageType::Urban,
        Some(b'2') => VillageType::Rural,
        _ => VillageType::Customary,
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WilayahDump {
    pub provinces: Vec<ProvinceRow>,
    pub cities: Vec<CityRow>,
    pub districts: Vec<DistrictRow>,
    pub villages: Vec<VillageRow>,
    pub skipped: usize,
}

impl WilayahDump {
    pub fn push(&mut self, unit: AdministrativeUnit) {
        match unit {
            AdministrativeUnit::Province(p) => self.provinces.push(p),
            AdministrativeUnit::City(c) => self.cities.push(c),
            AdministrativeUnit::District(d) => self.districts.push(d),
            AdministrativeUnit::Village(v) => self.villages.push(v),
        }
    }

    pub fn total(&self) -> usize {
        self.provinces.len() + self.cities.len() + self.districts.len() + self.villages.len()
    }
}

/// Extract every tuple from the dump text, line by line.
pub fn parse_dump(input: &str) -> WilayahDump {
    let mut dump = WilayahDump::default();
    for line in input.lines() {
        for caps in TUPLE_RE.captures_iter(line) {
            let code = &caps[1];
            let name = unescape_name(&caps[2]);
            match classify(code, &name) {
                Some(unit) => dump.push(unit),
                None => {
                    tracing::debug!(code = %code, "skipping tuple with unexpected code length");
                    dump.skipped += 1;
                }
            }
        }
    }
    dump
}

fn unescape_name(raw: &str) -> String {
    raw.replace("''", "'").replace("\\'", "'")
}

#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    pub batch_size: usize,
    pub truncate: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            truncate: false,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub provinces: u64,
    pub cities: u64,
    pub districts: u64,
    pub villages: u64,
}

/// Load a parsed dump in one transaction. Rows are upserted by id, so re-running
/// the same dump converges to the same tables; `truncate` reloads from scratch.
pub async fn import(
    pool: &DbPool,
    dump: &WilayahDump,
    options: ImportOptions,
) -> anyhow::Result<ImportReport> {
    let batch_size = options.batch_size.max(1);
    let mut tx = pool.begin().await?;

    if options.truncate {
        sqlx::query("TRUNCATE TABLE villages, districts, cities, provinces")
            .execute(&mut *tx)
            .await?;
        tracing::info!("truncated wilayah tables");
    }

    let provinces = insert_batches(
        &mut tx,
        &dump.provinces,
        batch_size,
        "INSERT INTO provinces (id, name) ",
        " ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name",
        |b, row| {
            b.push_bind(row.id.clone()).push_bind(row.name.clone());
        },
    )
    .await?;

    let cities = insert_batches(
        &mut tx,
        &dump.cities,
        batch_size,
        "INSERT INTO cities (id, province_id, name, city_type) ",
        " ON CONFLICT (id) DO UPDATE SET province_id = EXCLUDED.province_id, \
         name = EXCLUDED.name, city_type = EXCLUDED.city_type",
        |b, row| {
            b.push_bind(row.id.clone())
                .push_bind(row.province_id.clone())
                .push_bind(row.name.clone())
                .push_bind(row.city_type.as_str());
        },
    )
    .await?;

    let districts = insert_batches(
        &mut tx,
        &dump.districts,
        batch_size,
        "INSERT INTO districts (id, city_id, name) ",
        " ON CONFLICT (id) DO UPDATE SET city_id = EXCLUDED.city_id, name = EXCLUDED.name",
        |b, row| {
            b.push_bind(row.id.clone())
                .push_bind(row.city_id.clone())
                .push_bind(row.name.clone());
        },
    )
    .await?;

    let villages = insert_batches(
        &mut tx,
        &dump.villages,
        batch_size,
        "INSERT INTO villages (id, district_id, name, village_type) ",
        " ON CONFLICT (id) DO UPDATE SET district_id = EXCLUDED.district_id, \
         name = EXCLUDED.name, village_type = EXCLUDED.village_type",
        |b, row| {
            b.push_bind(row.id.clone())
                .push_bind(row.district_id.clone())
                .push_bind(row.name.clone())
                .push_bind(row.village_type.as_str());
        },
    )
    .await?;

    tx.commit().await?;

    Ok(ImportReport {
        provinces,
        cities,
        districts,
        villages,
    })
}

async fn insert_batches<T, F>(
    conn: &mut PgConnection,
    rows: &[T],
    batch_size: usize,
    head: &str,
    on_conflict: &str,
    mut bind: F,
) -> sqlx::Result<u64>
where
    F: FnMut(&mut Separated<'_, '_, Postgres, &'static str>, &T),
{
    let mut written = 0;
    for (index, chunk) in rows.chunks(batch_size).enumerate() {
        let mut qb = QueryBuilder::<Postgres>::new(head);
        qb.push_values(chunk, |mut b, row| bind(&mut b, row));
        qb.push(on_conflict);
        written += qb.build().execute(&mut *conn).await?.rows_affected();
        tracing::debug!(batch = index, rows = chunk.len(), "{}", head.trim());
    }
    Ok(written)
}
