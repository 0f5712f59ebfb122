// src/services/pesticides.rs
//! Built-in pesticide dosage reference.

use crate::models::PesticideDosage;

struct DosageEntry {
    product: &'static str,
    active_ingredient: &'static str,
    target_disease: &'static str,
    target_plant: &'static str,
    application_rate: &'static str,
    method: &'static str,
    timing: &'static str,
    max_applications_per_season: u32,
    preharvest_interval_days: u32,
    reentry_interval_hours: u32,
    environmental_impact: &'static str,
    cost: &'static str,
}

impl DosageEntry {
    fn to_dosage(&self) -> PesticideDosage {
        PesticideDosage {
            product: self.product.to_string(),
            active_ingredient: self.active_ingredient.to_string(),
            target_disease: self.target_disease.to_string(),
            target_plant: self.target_plant.to_string(),
            application_rate: self.application_rate.to_string(),
            method: self.method.to_string(),
            timing: self.timing.to_string(),
            max_applications_per_season: self.max_applications_per_season,
            preharvest_interval_days: self.preharvest_interval_days,
            reentry_interval_hours: self.reentry_interval_hours,
            environmental_impact: self.environmental_impact.to_string(),
            cost: self.cost.to_string(),
        }
    }
}

const DOSAGES: &[DosageEntry] = &[
    DosageEntry {
        product: "Copper Hydroxide 50 WP",
        active_ingredient: "Copper hydroxide",
        target_disease: "Late Blight",
        target_plant: "Tomato, Potato",
        application_rate: "2-3 g per litre of water",
        method: "Foliar spray to full coverage",
        timing: "Protectant, every 7-10 days in wet weather",
        max_applications_per_season: 6,
        preharvest_interval_days: 1,
        reentry_interval_hours: 48,
        environmental_impact: "Copper accumulates in soil; toxic to aquatic life",
        cost: "Low",
    },
    DosageEntry {
        product: "Bravo Weather Stik",
        active_ingredient: "Chlorothalonil",
        target_disease: "Early Blight",
        target_plant: "Tomato, Potato",
        application_rate: "1.5-2 ml per litre of water",
        method: "Foliar spray",
        timing: "At first symptoms, then every 7-14 days",
        max_applications_per_season: 4,
        preharvest_interval_days: 7,
        reentry_interval_hours: 48,
        environmental_impact: "Highly toxic to fish; keep away from waterways",
        cost: "Medium",
    },
    DosageEntry {
        product: "Dithane M-45",
        active_ingredient: "Mancozeb",
        target_disease: "Late Blight",
        target_plant: "Potato",
        application_rate: "2 g per litre of water",
        method: "Foliar spray",
        timing: "Before canopy closure, every 7 days under blight risk",
        max_applications_per_season: 8,
        preharvest_interval_days: 7,
        reentry_interval_hours: 24,
        environmental_impact: "Moderate; avoid spray drift onto water",
        cost: "Low",
    },
    DosageEntry {
        product: "Dithane M-45",
        active_ingredient: "Mancozeb",
        target_disease: "Downy Mildew",
        target_plant: "Grape",
        application_rate: "2 g per litre of water",
        method: "Foliar spray",
        timing: "From 15 cm shoot growth until fruit set",
        max_applications_per_season: 4,
        preharvest_interval_days: 66,
        reentry_interval_hours: 24,
        environmental_impact: "Moderate; avoid spray drift onto water",
        cost: "Low",
    },
    DosageEntry {
        product: "Thiovit Jet",
        active_ingredient: "Sulfur",
        target_disease: "Powdery Mildew",
        target_plant: "Grape, Cucumber, Apple",
        application_rate: "3-5 g per litre of water",
        method: "Foliar spray",
        timing: "Preventive, every 10-14 days; not above 30 °C",
        max_applications_per_season: 8,
        preharvest_interval_days: 1,
        reentry_interval_hours: 24,
        environmental_impact: "Low; can harm predatory mites",
        cost: "Low",
    },
    DosageEntry {
        product: "Systhane 20 EW",
        active_ingredient: "Myclobutanil",
        target_disease: "Powdery Mildew",
        target_plant: "Grape, Rose",
        application_rate: "0.5 ml per litre of water",
        method: "Foliar spray",
        timing: "Curative, at first signs, every 10-14 days",
        max_applications_per_season: 4,
        preharvest_interval_days: 14,
        reentry_interval_hours: 24,
        environmental_impact: "Moderately persistent in soil",
        cost: "Medium",
    },
    DosageEntry {
        product: "Systhane 20 EW",
        active_ingredient: "Myclobutanil",
        target_disease: "Black Spot",
        target_plant: "Rose",
        application_rate: "0.5 ml per litre of water",
        method: "Foliar spray",
        timing: "From bud break, every 14 days",
        max_applications_per_season: 6,
        preharvest_interval_days: 0,
        reentry_interval_hours: 24,
        environmental_impact: "Moderately persistent in soil",
        cost: "Medium",
    },
    DosageEntry {
        product: "Captan 80 WDG",
        active_ingredient: "Captan",
        target_disease: "Apple Scab",
        target_plant: "Apple, Pear",
        application_rate: "1.5-2 g per litre of water",
        method: "Foliar spray",
        timing: "Green tip through petal fall, every 7-10 days",
        max_applications_per_season: 10,
        preharvest_interval_days: 21,
        reentry_interval_hours: 72,
        environmental_impact: "Toxic to fish; low bee toxicity",
        cost: "Medium",
    },
    DosageEntry {
        product: "Neem Oil 70%",
        active_ingredient: "Clarified hydrophobic neem oil",
        target_disease: "Powdery Mildew",
        target_plant: "Rose, Vegetables",
        application_rate: "10 ml per litre of water",
        method: "Foliar spray, coat both leaf surfaces",
        timing: "Every 7-14 days, evening application",
        max_applications_per_season: 12,
        preharvest_interval_days: 0,
        reentry_interval_hours: 4,
        environmental_impact: "Low; avoid spraying open flowers visited by bees",
        cost: "Low",
    },
    DosageEntry {
        product: "Serenade ASO",
        active_ingredient: "Bacillus subtilis QST 713",
        target_disease: "Septoria Leaf Spot",
        target_plant: "Tomato",
        application_rate: "4-8 ml per litre of water",
        method: "Foliar spray",
        timing: "Preventive, every 7 days",
        max_applications_per_season: 12,
        preharvest_interval_days: 0,
        reentry_interval_hours: 4,
        environmental_impact: "Minimal",
        cost: "Medium",
    },
    DosageEntry {
        product: "Tilt 250 EC",
        active_ingredient: "Propiconazole",
        target_disease: "Common Rust",
        target_plant: "Corn, Wheat",
        application_rate: "0.5 l per hectare",
        method: "Boom spray",
        timing: "At first pustules, before tasseling",
        max_applications_per_season: 2,
        preharvest_interval_days: 30,
        reentry_interval_hours: 12,
        environmental_impact: "Toxic to aquatic organisms",
        cost: "High",
    },
];

/// Entries whose disease and crop contain the given filters,
/// case-insensitively. A missing or blank filter matches everything.
pub fn find_dosages(disease: Option<&str>, crop: Option<&str>) -> Vec<PesticideDosage> {
    let disease = normalized_filter(disease);
    let crop = normalized_filter(crop);

    DOSAGES
        .iter()
        .filter(|entry| matches(entry.target_disease, disease.as_deref()))
        .filter(|entry| matches(entry.target_plant, crop.as_deref()))
        .map(DosageEntry::to_dosage)
        .collect()
}

fn normalized_filter(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

fn matches(field: &str, filter: Option<&str>) -> bool {
    filter.is_none_or(|f| field.to_lowercase().contains(f))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_filters_return_whole_table() {
        assert_eq!(find_dosages(None, None).len(), DOSAGES.len());
        assert_eq!(find_dosages(Some("  "), Some("")).len(), DOSAGES.len());
    }

    #[test]
    fn filters_by_disease_case_insensitively() {
        let results = find_dosages(Some("POWDERY"), None);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|d| d.target_disease == "Powdery Mildew"));
    }

    #[test]
    fn combines_disease_and_crop_filters() {
        let results = find_dosages(Some("powdery mildew"), Some("grape"));
        let ingredients: Vec<&str> = results.iter().map(|d| d.active_ingredient.as_str()).collect();
        assert_eq!(ingredients, vec!["Sulfur", "Myclobutanil"]);

        let results = find_dosages(None, Some("rose"));
        assert!(results.iter().any(|d| d.target_disease == "Black Spot"));
    }

    #[test]
    fn unknown_disease_returns_nothing() {
        assert!(find_dosages(Some("fire blight"), None).is_empty());
    }
}
