// src/services/providers/plant_database.rs
use async_trait::async_trait;

use super::DiagnosisProvider;
use crate::errors::ProviderError;
use crate::models::{DiagnosisResult, ProviderId, Severity, Urgency};
use crate::services::image_processor::PreparedImage;
use crate::services::normalizer::RawDiagnosis;

struct KnownDisease {
    /// Plant keywords; empty for generic entries.
    plants: &'static [&'static str],
    disease: &'static str,
    confidence: f64,
    severity: Severity,
    urgency: Urgency,
    description: &'static str,
    symptoms: &'static [&'static str],
    causes: &'static [&'static str],
    organic: &'static [&'static str],
    chemical: &'static [&'static str],
    prevention: &'static [&'static str],
}

impl KnownDisease {
    fn to_result(&self) -> DiagnosisResult {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        DiagnosisResult {
            disease: self.disease.to_string(),
            confidence: self.confidence,
            severity: self.severity,
            description: self.description.to_string(),
            symptoms: owned(self.symptoms),
            possible_causes: owned(self.causes),
            organic_treatments: owned(self.organic),
            chemical_treatments: owned(self.chemical),
            preventive_measures: owned(self.prevention),
            urgency: self.urgency,
        }
    }
}

const DISEASES: &[KnownDisease] = &[
    KnownDisease {
        plants: &["tomato", "potato"],
        disease: "Early Blight",
        confidence: 0.65,
        severity: Severity::Medium,
        urgency: Urgency::Medium,
        description: "Alternaria solani infection producing target-like lesions on older leaves.",
        symptoms: &["Dark concentric rings on lower leaves", "Yellow halo around spots", "Premature leaf drop"],
        causes: &["Warm humid weather", "Spores overwintering in plant debris", "Splashing water"],
        organic: &["Remove infected leaves", "Copper fungicide every 7-10 days", "Mulch around the base"],
        chemical: &["Chlorothalonil", "Mancozeb", "Azoxystrobin"],
        prevention: &["Three-year crop rotation", "Drip irrigation", "Stake plants for airflow"],
    },
    KnownDisease {
        plants: &["tomato", "potato"],
        disease: "Late Blight",
        confidence: 0.6,
        severity: Severity::High,
        urgency: Urgency::Immediate,
        description: "Phytophthora infestans infection that spreads rapidly in cool wet weather.",
        symptoms: &["Greasy grey-green patches on leaves", "White mould on leaf undersides", "Brown firm rot on fruit or tubers"],
        causes: &["Cool nights with long leaf wetness", "Infected seed potatoes", "Airborne spores from nearby crops"],
        organic: &["Remove and bag infected plants", "Copper hydroxide protectant sprays"],
        chemical: &["Mancozeb", "Cymoxanil", "Mandipropamid"],
        prevention: &["Plant certified disease-free stock", "Avoid overhead watering", "Destroy volunteer plants"],
    },
    KnownDisease {
        plants: &["tomato"],
        disease: "Septoria Leaf Spot",
        confidence: 0.6,
        severity: Severity::Medium,
        urgency: Urgency::Medium,
        description: "Septoria lycopersici infection causing many small spots on lower foliage.",
        symptoms: &["Small circular spots with dark borders", "Grey centres with black specks", "Lower leaves yellow and drop"],
        causes: &["Wet foliage", "Infected debris", "Dense planting"],
        organic: &["Prune lower leaves", "Copper or Bacillus subtilis sprays"],
        chemical: &["Chlorothalonil", "Mancozeb"],
        prevention: &["Water at soil level", "Clear debris after harvest"],
    },
    KnownDisease {
        plants: &["grape", "cucumber", "squash", "zucchini", "pumpkin", "melon", "rose", "apple"],
        disease: "Powdery Mildew",
        confidence: 0.7,
        severity: Severity::Low,
        urgency: Urgency::Low,
        description: "Fungal growth forming a white powdery film on leaves, shoots and fruit.",
        symptoms: &["White powdery patches", "Distorted young leaves", "Russeted fruit skin"],
        causes: &["Warm days with cool nights", "Shade and poor airflow", "Excess nitrogen"],
        organic: &["Sulfur dust or wettable sulfur", "Potassium bicarbonate spray", "Neem oil"],
        chemical: &["Myclobutanil", "Trifloxystrobin"],
        prevention: &["Open the canopy by pruning", "Choose resistant cultivars"],
    },
    KnownDisease {
        plants: &["grape", "cucumber", "lettuce", "basil", "onion"],
        disease: "Downy Mildew",
        confidence: 0.6,
        severity: Severity::Medium,
        urgency: Urgency::High,
        description: "Oomycete infection favoured by humid nights and wet leaves.",
        symptoms: &["Yellow angular patches on upper leaf surface", "Grey-purple fuzz underneath", "Leaf browning and drop"],
        causes: &["Extended leaf wetness", "High humidity", "Infected transplants"],
        organic: &["Copper fungicide", "Remove infected leaves promptly"],
        chemical: &["Metalaxyl-M", "Fosetyl-aluminium", "Mandipropamid"],
        prevention: &["Improve air circulation", "Water in the morning"],
    },
    KnownDisease {
        plants: &["rose"],
        disease: "Black Spot",
        confidence: 0.7,
        severity: Severity::Medium,
        urgency: Urgency::Medium,
        description: "Diplocarpon rosae infection causing defoliation of roses.",
        symptoms: &["Black spots with feathered edges", "Yellowing leaves", "Early leaf drop"],
        causes: &["Rain splash", "Leaves staying wet overnight"],
        organic: &["Remove fallen leaves", "Neem oil or sulfur sprays"],
        chemical: &["Tebuconazole", "Myclobutanil"],
        prevention: &["Resistant varieties", "Morning watering at the base"],
    },
    KnownDisease {
        plants: &["apple", "pear", "crabapple"],
        disease: "Apple Scab",
        confidence: 0.65,
        severity: Severity::Medium,
        urgency: Urgency::Medium,
        description: "Venturia inaequalis infection marking leaves and fruit with olive-brown scabs.",
        symptoms: &["Olive-green velvety leaf spots", "Corky scabs on fruit", "Cracked fruit"],
        causes: &["Wet spring weather", "Spores from overwintered leaves"],
        organic: &["Rake and compost fallen leaves", "Sulfur sprays from green tip"],
        chemical: &["Captan", "Myclobutanil", "Dodine"],
        prevention: &["Plant scab-resistant cultivars", "Prune for airflow"],
    },
    KnownDisease {
        plants: &["corn", "maize", "bean", "wheat"],
        disease: "Common Rust",
        confidence: 0.6,
        severity: Severity::Low,
        urgency: Urgency::Low,
        description: "Rust fungus producing powdery orange-brown pustules on leaves.",
        symptoms: &["Raised rust-coloured pustules", "Leaf yellowing around pustules"],
        causes: &["Moderate temperatures with dew", "Wind-borne spores"],
        organic: &["Remove heavily infected leaves", "Sulfur sprays"],
        chemical: &["Propiconazole", "Azoxystrobin"],
        prevention: &["Resistant hybrids", "Avoid late planting"],
    },
    KnownDisease {
        plants: &[],
        disease: "Fungal Leaf Spot",
        confidence: 0.5,
        severity: Severity::Medium,
        urgency: Urgency::Medium,
        description: "General fungal leaf spotting common across garden plants.",
        symptoms: &["Brown or black spots on leaves", "Yellowing around spots"],
        causes: &["Wet foliage", "Crowded planting"],
        organic: &["Remove affected leaves", "Copper-based fungicide"],
        chemical: &["Chlorothalonil"],
        prevention: &["Water at the base", "Improve spacing"],
    },
    KnownDisease {
        plants: &[],
        disease: "Nutrient Deficiency",
        confidence: 0.45,
        severity: Severity::Low,
        urgency: Urgency::Low,
        description: "Leaf discolouration consistent with nitrogen or magnesium shortage.",
        symptoms: &["Pale or yellow older leaves", "Interveinal chlorosis", "Slow growth"],
        causes: &["Depleted soil", "Incorrect soil pH", "Root damage"],
        organic: &["Compost or well-rotted manure", "Epsom salt foliar spray for magnesium"],
        chemical: &["Balanced NPK fertilizer"],
        prevention: &["Soil test each season", "Mulch to hold nutrients"],
    },
];

/// Offline keyword lookup. Always available; also the target for unknown
/// provider identifiers.
#[derive(Debug, Clone, Default)]
pub struct PlantDatabase;

impl PlantDatabase {
    pub fn new() -> Self {
        Self
    }

    /// Deterministic for a given plant type and image size.
    pub fn lookup(&self, plant_type: &str, image: &[u8]) -> DiagnosisResult {
        let plant = plant_type.trim().to_lowercase();
        let mut candidates: Vec<&KnownDisease> = DISEASES
            .iter()
            .filter(|d| !plant.is_empty() && d.plants.iter().any(|p| plant.contains(p)))
            .collect();
        if candidates.is_empty() {
            candidates = DISEASES.iter().filter(|d| d.plants.is_empty()).collect();
        }

        candidates[image.len() % candidates.len()].to_result()
    }
}

#[async_trait]
impl DiagnosisProvider for PlantDatabase {
    fn id(&self) -> ProviderId {
        ProviderId::PlantDatabase
    }

    fn model(&self) -> &str {
        "static-lookup"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn request_diagnosis(
        &self,
        image: &PreparedImage,
        plant_type: &str,
    ) -> Result<RawDiagnosis, ProviderError> {
        Ok(RawDiagnosis::PlantDatabase(
            self.lookup(plant_type, &image.data),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_plant_keyword() {
        let db = PlantDatabase::new();
        let result = db.lookup("Cherry Tomato", &[0u8; 3]);
        assert!(
            ["Early Blight", "Late Blight", "Septoria Leaf Spot"].contains(&result.disease.as_str())
        );
        assert_eq!(db.lookup("rose bush", b"x").disease, "Black Spot");
    }

    #[test]
    fn same_input_gives_same_answer() {
        let db = PlantDatabase::new();
        let image = vec![7u8; 1234];
        assert_eq!(db.lookup("grape", &image), db.lookup("grape", &image));
    }

    #[test]
    fn unknown_plants_get_generic_entries() {
        let db = PlantDatabase::new();
        for size in 0..4 {
            let result = db.lookup("monstera", &vec![0u8; size]);
            assert!(
                ["Fungal Leaf Spot", "Nutrient Deficiency"].contains(&result.disease.as_str())
            );
        }
        let result = db.lookup("", b"");
        assert_eq!(result.disease, "Fungal Leaf Spot");
    }

    #[test]
    fn every_entry_is_complete() {
        for entry in DISEASES {
            let result = entry.to_result();
            assert!((0.0..=1.0).contains(&result.confidence));
            assert!(!result.symptoms.is_empty());
            assert!(!result.organic_treatments.is_empty());
            assert!(!result.chemical_treatments.is_empty());
            assert!(!result.preventive_measures.is_empty());
        }
    }
}
