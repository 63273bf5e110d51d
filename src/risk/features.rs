//! Patient profile to classifier input

use thiserror::Error;

use crate::models::{Checkup, GeneralHealth, PatientProfile};

/// Column order the classifier artifact is trained on
pub const FEATURE_NAMES: [&str; 25] = [
    "general_health",
    "checkup",
    "exercise",
    "skin_cancer",
    "other_cancer",
    "depression",
    "diabetes",
    "arthritis",
    "age_category",
    "bmi_category",
    "smoking_history",
    "alcohol_consumption",
    "fruit_consumption",
    "green_vegetables_consumption",
    "fried_potato_consumption",
    "sex_female",
    "sex_male",
    "lifestyle_score",
    "healthy_diet_score",
    "smoking_alcohol",
    "checkup_exercise",
    "height_to_weight",
    "fruit_vegetables",
    "healthy_diet_lifestyle",
    "alcohol_fried_potato",
];

/// A clinical input the score cannot be computed without
#[derive(Debug, Error, PartialEq)]
#[error("{0}: This field is required to compute the risk score.")]
pub struct MissingInput(pub &'static str);

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub general_health: f64,
    pub checkup: f64,
    pub exercise: f64,
    pub skin_cancer: f64,
    pub other_cancer: f64,
    pub depression: f64,
    pub diabetes: f64,
    pub arthritis: f64,
    pub age_category: f64,
    pub bmi_category: f64,
    pub smoking_history: f64,
    pub alcohol_consumption: f64,
    pub fruit_consumption: f64,
    pub green_vegetables_consumption: f64,
    pub fried_potato_consumption: f64,
    pub sex_female: f64,
    pub sex_male: f64,
    pub lifestyle_score: f64,
    pub healthy_diet_score: f64,
    pub smoking_alcohol: f64,
    pub checkup_exercise: f64,
    pub height_to_weight: f64,
    pub fruit_vegetables: f64,
    pub healthy_diet_lifestyle: f64,
    pub alcohol_fried_potato: f64,
}

fn general_health_score(health: GeneralHealth) -> f64 {
    match health {
        GeneralHealth::Poor => 0.0,
        GeneralHealth::Fair => 1.0,
        GeneralHealth::Good => 2.0,
        GeneralHealth::VeryGood => 3.0,
        GeneralHealth::Excellent => 4.0,
    }
}

fn checkup_weight(checkup: Checkup) -> f64 {
    match checkup {
        Checkup::WithinPastYear => 4.0,
        Checkup::WithinPast2Years => 2.0,
        Checkup::WithinPast5Years => 1.0,
        Checkup::FiveOrMoreYearsAgo => 0.2,
        Checkup::Never => 0.0,
    }
}

/// Five-year brackets from 24, clamped to 0 and 12
pub fn age_bracket(age: u32) -> u32 {
    match age {
        80.. => 12,
        0..=23 => 0,
        _ => age / 5 - 4,
    }
}

pub fn bmi_bracket(bmi: f64) -> u32 {
    if bmi <= 18.5 {
        0
    } else if bmi <= 24.9 {
        1
    } else if bmi <= 29.9 {
        2
    } else {
        3
    }
}

/// One-hot over the two known values, both zero otherwise
fn sex_indicators(sex: Option<&str>) -> (f64, f64) {
    match sex.map(|s| s.trim().to_lowercase()).as_deref() {
        Some("female") => (1.0, 0.0),
        Some("male") => (0.0, 1.0),
        _ => (0.0, 0.0),
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, MissingInput> {
    value.ok_or(MissingInput(field))
}

impl FeatureVector {
    pub fn from_profile(profile: &PatientProfile) -> Result<Self, MissingInput> {
        let general_health =
            general_health_score(required(profile.general_health, "general_health")?);
        let checkup = checkup_weight(required(profile.checkup, "checkup")?);
        let age = required(profile.age, "age")?;
        let bmi = required(profile.bmi, "bmi")?;
        let height = f64::from(required(profile.height, "height")?);
        let weight = f64::from(required(profile.weight, "weight")?);
        let alcohol = required(profile.alcohol_consumption, "alcohol_consumption")?;
        let fruit = required(profile.fruit_consumption, "fruit_consumption")?;
        let vegetables = required(
            profile.green_vegetable_consumption,
            "green_vegetable_consumption",
        )?;
        let fried_potato = required(profile.fried_potato_consumption, "fried_potato_consumption")?;

        let exercise = flag(profile.exercise);
        let smoking = -f64::from(i32::from(profile.smoking_history));
        let (sex_female, sex_male) = sex_indicators(profile.sex.as_deref());

        let lifestyle_score = exercise + smoking + (fruit + vegetables - alcohol) / 10.0;
        let healthy_diet_score = (fruit + vegetables - fried_potato) / 10.0;

        Ok(Self {
            general_health,
            checkup,
            exercise,
            skin_cancer: flag(profile.skin_cancer),
            other_cancer: flag(profile.other_cancer),
            depression: flag(profile.depression),
            diabetes: flag(profile.diabetes),
            arthritis: flag(profile.arthritis),
            age_category: f64::from(age_bracket(age)),
            bmi_category: f64::from(bmi_bracket(bmi)),
            smoking_history: smoking,
            alcohol_consumption: alcohol,
            fruit_consumption: fruit,
            green_vegetables_consumption: vegetables,
            fried_potato_consumption: fried_potato,
            sex_female,
            sex_male,
            lifestyle_score,
            healthy_diet_score,
            smoking_alcohol: smoking * alcohol,
            checkup_exercise: checkup * exercise,
            height_to_weight: height / weight,
            fruit_vegetables: fruit * vegetables,
            healthy_diet_lifestyle: healthy_diet_score * lifestyle_score,
            alcohol_fried_potato: alcohol * fried_potato,
        })
    }

    /// Values in [`FEATURE_NAMES`] order
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.general_health,
            self.checkup,
            self.exercise,
            self.skin_cancer,
            self.other_cancer,
            self.depression,
            self.diabetes,
            self.arthritis,
            self.age_category,
            self.bmi_category,
            self.smoking_history,
            self.alcohol_consumption,
            self.fruit_consumption,
            self.green_vegetables_consumption,
            self.fried_potato_consumption,
            self.sex_female,
            self.sex_male,
            self.lifestyle_score,
            self.healthy_diet_score,
            self.smoking_alcohol,
            self.checkup_exercise,
            self.height_to_weight,
            self.fruit_vegetables,
            self.healthy_diet_lifestyle,
            self.alcohol_fried_potato,
        ]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A profile with every clinical input filled in
    pub(crate) fn complete_profile() -> PatientProfile {
        PatientProfile {
            height: Some(180),
            weight: Some(90),
            general_health: Some(GeneralHealth::VeryGood),
            checkup: Some(Checkup::WithinPastYear),
            exercise: true,
            diabetes: true,
            sex: Some("Male".into()),
            age: Some(52),
            bmi: Some(27.8),
            smoking_history: true,
            alcohol_consumption: Some(4.0),
            fruit_consumption: Some(30.0),
            green_vegetable_consumption: Some(12.0),
            fried_potato_consumption: Some(8.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_age_brackets() {
        let cases = [(0, 0), (23, 0), (24, 0), (25, 1), (29, 1), (30, 2), (52, 6), (79, 11), (80, 12), (100, 12)];
        for (age, expected) in cases {
            assert_eq!(age_bracket(age), expected, "Wrong bracket for age {age}");
        }
    }

    #[test]
    fn test_bmi_brackets() {
        let cases = [
            (12.0, 0),
            (18.4, 0),
            (18.5, 0),
            (18.6, 1),
            (24.9, 1),
            (25.0, 2),
            (29.9, 2),
            (30.0, 3),
            (45.0, 3),
        ];
        for (bmi, expected) in cases {
            assert_eq!(bmi_bracket(bmi), expected, "Wrong category for BMI {bmi}");
        }
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let profile = complete_profile();
        let first = FeatureVector::from_profile(&profile).unwrap();
        let second = FeatureVector::from_profile(&profile).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_vec(), second.to_vec());
        assert_eq!(first.to_vec().len(), FEATURE_NAMES.len());
    }

    #[test]
    fn test_mapped_values() {
        let features = FeatureVector::from_profile(&complete_profile()).unwrap();

        assert_eq!(features.general_health, 3.0);
        assert_eq!(features.checkup, 4.0);
        assert_eq!(features.age_category, 6.0);
        assert_eq!(features.bmi_category, 2.0);
        assert_eq!(features.smoking_history, -1.0);
        assert_eq!((features.sex_female, features.sex_male), (0.0, 1.0));
        assert_eq!(features.diabetes, 1.0);
        assert_eq!(features.depression, 0.0);

        // 1 - 1 + (30 + 12 - 4) / 10
        assert!((features.lifestyle_score - 3.8).abs() < 1e-9);
        // (30 + 12 - 8) / 10
        assert!((features.healthy_diet_score - 3.4).abs() < 1e-9);
        assert_eq!(features.smoking_alcohol, -4.0);
        assert_eq!(features.checkup_exercise, 4.0);
        assert_eq!(features.height_to_weight, 2.0);
        assert_eq!(features.fruit_vegetables, 360.0);
        assert!((features.healthy_diet_lifestyle - 3.4 * 3.8).abs() < 1e-9);
        assert_eq!(features.alcohol_fried_potato, 32.0);
    }

    #[test]
    fn test_checkup_weights() {
        let cases = [
            (Checkup::WithinPastYear, 4.0),
            (Checkup::WithinPast2Years, 2.0),
            (Checkup::WithinPast5Years, 1.0),
            (Checkup::FiveOrMoreYearsAgo, 0.2),
            (Checkup::Never, 0.0),
        ];
        for (checkup, expected) in cases {
            assert_eq!(checkup_weight(checkup), expected, "Wrong weight for {checkup}");
        }
    }

    #[test]
    fn test_sex_one_hot() {
        assert_eq!(sex_indicators(Some("Female")), (1.0, 0.0));
        assert_eq!(sex_indicators(Some(" male ")), (0.0, 1.0));
        assert_eq!(sex_indicators(Some("other")), (0.0, 0.0));
        assert_eq!(sex_indicators(None), (0.0, 0.0));
    }

    #[test]
    fn test_missing_input_is_named() {
        let mut profile = complete_profile();
        profile.bmi = None;
        assert_eq!(FeatureVector::from_profile(&profile), Err(MissingInput("bmi")));

        let empty = PatientProfile::default();
        assert_eq!(
            FeatureVector::from_profile(&empty),
            Err(MissingInput("general_health"))
        );
    }
}
