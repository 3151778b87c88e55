use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{FieldChanges, FieldValue, RecordId};

/// Workplace coordinates. Only present when both halves parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: Decimal,
    pub longitude: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildProfile {
    pub full_name: String,
    pub age: Decimal,
    pub current_grade: Option<String>,
    pub education_stage: Option<String>,
    pub preferred_curriculum: Option<String>,
}

/// Typed result of a completed relocation questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationProfile {
    pub nationality: String,
    pub family_size: i64,
    pub has_partner: bool,

    // Work
    pub occupation: String,
    pub work_city: String,
    pub industry: Option<String>,
    pub work_location: Option<GeoPoint>,

    // Budget & lifestyle
    pub budget_min: Decimal,
    pub budget_max: Decimal,
    pub owns_car: bool,

    pub children: Vec<ChildProfile>,
}

impl RelocationProfile {
    /// Columns written back to the user's `profiles` row.
    pub fn profile_changes(&self) -> FieldChanges {
        let mut changes = FieldChanges::new();
        changes.insert("nationality".into(), self.nationality.clone().into());
        changes.insert("family_size".into(), self.family_size.into());
        changes
    }

    /// Columns for the `workplaces` row describing the new job.
    pub fn workplace_fields(&self) -> FieldChanges {
        let mut fields = FieldChanges::new();
        fields.insert("name".into(), self.occupation.clone().into());
        fields.insert("city".into(), self.work_city.clone().into());
        fields.insert("industry".into(), self.industry.clone().into());
        fields.insert(
            "latitude".into(),
            self.work_location.map(|p| p.latitude).into(),
        );
        fields.insert(
            "longitude".into(),
            self.work_location.map(|p| p.longitude).into(),
        );
        fields
    }

    /// Columns for the user's `preferences` row.
    pub fn preference_fields(
        &self,
        user_id: RecordId,
        workplace_id: Option<RecordId>,
    ) -> FieldChanges {
        let mut fields = FieldChanges::new();
        fields.insert("user_id".into(), user_id.into());
        fields.insert("budget_min".into(), self.budget_min.into());
        fields.insert("budget_max".into(), self.budget_max.into());
        fields.insert("owns_car".into(), self.owns_car.into());
        fields.insert("workplace_id".into(), workplace_id.into());
        fields
    }

    /// One `children` row per child, in questionnaire order.
    pub fn child_fields(
        &self,
        user_id: RecordId,
    ) -> Vec<FieldChanges> {
        self.children
            .iter()
            .map(|child| {
                let mut fields = FieldChanges::new();
                fields.insert("user_id".into(), user_id.into());
                fields.insert("full_name".into(), child.full_name.clone().into());
                fields.insert("age".into(), age_value(child.age));
                fields.insert("current_grade".into(), child.current_grade.clone().into());
                fields.insert(
                    "education_stage".into(),
                    child.education_stage.clone().into(),
                );
                fields.insert(
                    "preferred_curriculum".into(),
                    child.preferred_curriculum.clone().into(),
                );
                fields
            })
            .collect()
    }
}

fn age_value(age: Decimal) -> FieldValue {
    if age.fract().is_zero() {
        i64::try_from(age).map_or(FieldValue::Decimal(age), FieldValue::Integer)
    } else {
        FieldValue::Decimal(age)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn profile() -> RelocationProfile {
        RelocationProfile {
            nationality: "Portuguese".into(),
            family_size: 3,
            has_partner: true,
            occupation: "Engineer".into(),
            work_city: "Dubai".into(),
            industry: None,
            work_location: Some(GeoPoint {
                latitude: dec!(25.2048),
                longitude: dec!(55.2708),
            }),
            budget_min: dec!(5000),
            budget_max: dec!(9000),
            owns_car: false,
            children: vec![ChildProfile {
                full_name: "Noah".into(),
                age: dec!(6),
                current_grade: Some("Grade 1".into()),
                education_stage: None,
                preferred_curriculum: Some("IB".into()),
            }],
        }
    }

    #[test]
    fn workplace_fields_carry_coordinates() {
        let fields = profile().workplace_fields();
        assert_eq!(fields["latitude"], FieldValue::Decimal(dec!(25.2048)));
        assert_eq!(fields["industry"], FieldValue::Null);
    }

    #[test]
    fn whole_ages_are_stored_as_integers() {
        let rows = profile().child_fields(4);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["age"], FieldValue::Integer(6));
        assert_eq!(rows[0]["user_id"], FieldValue::Integer(4));
    }

    #[test]
    fn preference_fields_link_workplace() {
        let fields = profile().preference_fields(4, Some(9));
        assert_eq!(fields["workplace_id"], FieldValue::Integer(9));
        assert_eq!(fields["owns_car"], FieldValue::Bool(false));
    }
}
