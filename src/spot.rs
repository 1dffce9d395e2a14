/// Surf spot registry for the prediction service.
///
/// Defines the single monitored river wave along with its gauge metadata
/// and the surfability threshold. This is the single source of truth for
/// spot constants — all other modules should reference the spot from here
/// rather than hardcoding gauge ids, coordinates, or thresholds.

/// Metadata for a monitored surf spot.
pub struct Spot {
    /// HND Bayern gauge number for the water-level table.
    pub gauge_id: &'static str,
    /// Human-readable spot name.
    pub name: &'static str,
    /// WGS84 latitude, used for Open-Meteo archive queries.
    pub latitude: f64,
    /// WGS84 longitude.
    pub longitude: f64,
    /// Water level below which the wave does not form, in cm.
    /// Predictions below this are forced to zero before the model runs.
    pub min_surfable_level_cm: f64,
    /// Default URL of the HND water-level history table for this gauge.
    pub history_url: &'static str,
}

/// The river wave at Himmelreichbrücke on the Isar in Munich.
pub static SPOT: Spot = Spot {
    gauge_id: "16515005",
    name: "Isar, München Himmelreichbrücke",
    latitude: 48.137154,
    longitude: 11.576124,
    min_surfable_level_cm: 130.0,
    history_url: "https://www.hnd.bayern.de/pegel/isar/muenchen-himmelreichbruecke-16515005/tabelle?methode=wasserstand&days=365",
};
