// src/services/mock.rs
use rand::Rng;

use crate::models::{DiagnosisResult, Severity, Urgency};

/// Stand-in diagnoses served when no real provider answer is available, so
/// the client always receives a complete payload.
#[derive(Debug, Clone, Default)]
pub struct MockGenerator;

impl MockGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn catalogue(&self, plant_type: &str) -> Vec<DiagnosisResult> {
        let plant = display_plant(plant_type);
        vec![
            DiagnosisResult {
                disease: "Early Blight".to_string(),
                confidence: 0.75,
                severity: Severity::Medium,
                description: format!(
                    "Fungal disease caused by Alternaria solani producing concentric ring lesions on older {} leaves.",
                    plant
                ),
                symptoms: vec![
                    "Brown spots with concentric rings".to_string(),
                    "Yellowing around lesions".to_string(),
                    "Lower leaves affected first".to_string(),
                ],
                possible_causes: vec![
                    "Warm, humid weather".to_string(),
                    "Overhead watering".to_string(),
                    "Infected plant debris in soil".to_string(),
                ],
                organic_treatments: vec![
                    "Remove and destroy affected leaves".to_string(),
                    "Apply copper-based fungicide".to_string(),
                    "Mulch to prevent soil splash".to_string(),
                ],
                chemical_treatments: vec![
                    "Chlorothalonil".to_string(),
                    "Mancozeb".to_string(),
                ],
                preventive_measures: vec![
                    "Rotate crops every 2-3 years".to_string(),
                    "Water at the base of plants".to_string(),
                    "Space plants for air circulation".to_string(),
                ],
                urgency: Urgency::Medium,
            },
            DiagnosisResult {
                disease: "Powdery Mildew".to_string(),
                confidence: 0.7,
                severity: Severity::Low,
                description: format!(
                    "Fungal disease forming a white powdery coating on {} leaves and stems.",
                    plant
                ),
                symptoms: vec![
                    "White powdery patches on leaves".to_string(),
                    "Curling or distorted new growth".to_string(),
                ],
                possible_causes: vec![
                    "High humidity with dry foliage".to_string(),
                    "Poor air circulation".to_string(),
                    "Shaded planting sites".to_string(),
                ],
                organic_treatments: vec![
                    "Spray diluted neem oil".to_string(),
                    "Apply potassium bicarbonate".to_string(),
                    "Prune crowded growth".to_string(),
                ],
                chemical_treatments: vec![
                    "Sulfur-based fungicide".to_string(),
                    "Myclobutanil".to_string(),
                ],
                preventive_measures: vec![
                    "Plant resistant varieties".to_string(),
                    "Avoid excess nitrogen fertilizer".to_string(),
                ],
                urgency: Urgency::Low,
            },
        ]
    }

    pub fn generate(&self, plant_type: &str) -> DiagnosisResult {
        let mut rng = rand::thread_rng();
        self.generate_with(&mut rng, plant_type)
    }

    pub fn generate_with<R: Rng>(&self, rng: &mut R, plant_type: &str) -> DiagnosisResult {
        let mut catalogue = self.catalogue(plant_type);
        let index = rng.gen_range(0..catalogue.len());
        catalogue.swap_remove(index)
    }
}

fn display_plant(plant_type: &str) -> String {
    let plant = plant_type.trim();
    if plant.is_empty() {
        "plant".to_string()
    } else {
        plant.to_lowercase()
    }
}
