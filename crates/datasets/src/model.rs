use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Immutable catalog entry describing one industry vertical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Industry {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub naics_codes: Vec<String>,
    #[serde(default)]
    pub description: String,
}

/// Per-county entry of one industry's score set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountyScore {
    pub fips: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
    /// Primary metric, already normalized to 0-100 by the offline pipeline.
    pub score: f64,
    #[serde(default)]
    pub establishment_count: f64,
    #[serde(default)]
    pub population_per_biz: f64,
}

/// One industry's scores, keyed by county FIPS. Immutable once cached.
pub type ScoreSet = BTreeMap<String, CountyScore>;

/// Which per-county value drives the fill encoding.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ScoreMetric {
    #[default]
    Score,
    EstablishmentCount,
    PopulationPerBiz,
}

impl ScoreMetric {
    /// The primary metric is pre-normalized to 0-100; the others need
    /// min-max scaling before color encoding.
    pub fn is_primary(&self) -> bool {
        matches!(self, ScoreMetric::Score)
    }

    pub fn value_of(&self, entry: &CountyScore) -> f64 {
        match self {
            ScoreMetric::Score => entry.score,
            ScoreMetric::EstablishmentCount => entry.establishment_count,
            ScoreMetric::PopulationPerBiz => entry.population_per_biz,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "score" => Some(ScoreMetric::Score),
            "establishment-count" => Some(ScoreMetric::EstablishmentCount),
            "population-per-biz" => Some(ScoreMetric::PopulationPerBiz),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScoreMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScoreMetric::Score => "score",
            ScoreMetric::EstablishmentCount => "establishment-count",
            ScoreMetric::PopulationPerBiz => "population-per-biz",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AgeDistribution {
    #[serde(rename = "under18", default)]
    pub under_18: f64,
    #[serde(rename = "age18to34", default)]
    pub age_18_to_34: f64,
    #[serde(rename = "age35to54", default)]
    pub age_35_to_54: f64,
    #[serde(rename = "age55to74", default)]
    pub age_55_to_74: f64,
    #[serde(rename = "age75plus", default)]
    pub age_75_plus: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IncomeDistribution {
    #[serde(rename = "under25k", default)]
    pub under_25k: f64,
    #[serde(rename = "income25kTo50k", default)]
    pub income_25k_to_50k: f64,
    #[serde(rename = "income50kTo75k", default)]
    pub income_50k_to_75k: f64,
    #[serde(rename = "income75kTo100k", default)]
    pub income_75k_to_100k: f64,
    #[serde(rename = "over100k", default)]
    pub over_100k: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateAverages {
    #[serde(default)]
    pub median_income: f64,
    #[serde(default)]
    pub median_age: f64,
    #[serde(default)]
    pub population_per_sq_mi: f64,
}

/// Per-county demographics record from the consolidated table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountyDemographics {
    pub fips: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub population: u64,
    #[serde(default)]
    pub median_income: f64,
    #[serde(default)]
    pub median_age: f64,
    #[serde(default)]
    pub household_size: f64,
    #[serde(default)]
    pub population_growth: f64,
    #[serde(default)]
    pub age_distribution: AgeDistribution,
    #[serde(default)]
    pub income_distribution: IncomeDistribution,
    #[serde(default)]
    pub state_averages: StateAverages,
}

/// The whole demographics table, keyed by county FIPS. Loaded at most once.
pub type AllDemographics = BTreeMap<String, CountyDemographics>;

#[cfg(test)]
mod tests {
    use super::{AllDemographics, CountyScore, Industry, ScoreMetric, ScoreSet};

    #[test]
    fn industry_parses_pipeline_shape() {
        let raw = r#"{
            "id": "coffee-shops",
            "label": "Coffee Shops",
            "naicsCodes": ["722515"],
            "description": "Snack and nonalcoholic beverage bars"
        }"#;
        let industry: Industry = serde_json::from_str(raw).unwrap();
        assert_eq!(industry.id, "coffee-shops");
        assert_eq!(industry.naics_codes, vec!["722515"]);
    }

    #[test]
    fn score_set_parses_pipeline_shape() {
        let raw = r#"{
            "48201": {
                "fips": "48201",
                "name": "Harris County",
                "state": "TX",
                "score": 91,
                "establishmentCount": 412,
                "populationPerBiz": 11480
            }
        }"#;
        let set: ScoreSet = serde_json::from_str(raw).unwrap();
        let entry = &set["48201"];
        assert_eq!(entry.state, "TX");
        assert_eq!(entry.score, 91.0);
        assert_eq!(entry.establishment_count, 412.0);
    }

    #[test]
    fn metric_reads_the_right_field() {
        let entry = CountyScore {
            fips: "12011".to_string(),
            name: "Broward County".to_string(),
            state: "FL".to_string(),
            score: 82.0,
            establishment_count: 120.0,
            population_per_biz: 16_000.0,
        };
        assert_eq!(ScoreMetric::Score.value_of(&entry), 82.0);
        assert_eq!(ScoreMetric::EstablishmentCount.value_of(&entry), 120.0);
        assert_eq!(ScoreMetric::PopulationPerBiz.value_of(&entry), 16_000.0);
        assert!(ScoreMetric::Score.is_primary());
        assert!(!ScoreMetric::PopulationPerBiz.is_primary());
    }

    #[test]
    fn demographics_parses_bracket_names() {
        let raw = r#"{
            "12011": {
                "fips": "12011",
                "name": "Broward County",
                "state": "FL",
                "population": 1944375,
                "medianIncome": 64522,
                "medianAge": 40.6,
                "populationGrowth": 0.04,
                "ageDistribution": {"under18": 21.4, "age18to34": 22.0},
                "incomeDistribution": {"under25k": 16.9, "income25kTo50k": 21.3},
                "stateAverages": {"medianIncome": 61777, "medianAge": 42.7}
            }
        }"#;
        let table: AllDemographics = serde_json::from_str(raw).unwrap();
        let county = &table["12011"];
        assert_eq!(county.population, 1_944_375);
        assert_eq!(county.age_distribution.age_18_to_34, 22.0);
        assert_eq!(county.income_distribution.income_25k_to_50k, 21.3);
        assert_eq!(county.state_averages.median_income, 61_777.0);
        // Absent brackets default to zero instead of failing the parse.
        assert_eq!(county.income_distribution.over_100k, 0.0);
    }
}
