pub mod lots;
pub mod portfolio;
pub mod resolver;

pub use lots::{compare_lots, expand_lots, LotLabel};
pub use portfolio::{
    group_by_owner, group_by_property, Holding, OwnerMap, OwnerPortfolio, PropertyLot, PropertyLots,
    PropertyMap,
};
pub use resolver::{resolve_owners, LotMap, LotOwnership};

/// Serde adapter writing act dates as `DD/MM/YYYY`, the way the filing prints them.
pub(crate) mod dmy {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%d/%m/%Y";

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(d)?;
        NaiveDate::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}
