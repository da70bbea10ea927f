//! Polymorphic `[x]` elements.
//!
//! Each choice is an enum carried on its parent with
//! `#[serde(flatten, deserialize_with = "...")]`, so one sibling key
//! (`valueQuantity`, `onsetDateTime`, ...) appears on the wire. Decoding
//! goes through [`optional`] or [`required`] rather than serde's own
//! flattened `Option`, which would turn a bad nested code into `None` and
//! keep only the first of several `value*` keys.

use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::datatypes::{
    Age, CodeableConcept, Duration, Period, Quantity, Range, Ratio, Reference, SampledData, Timing,
};
use super::primitives::FhirDateTime;

/// A `[x]` element: its FHIR name and the wire key of every variant.
pub trait Choice: Serialize + DeserializeOwned {
    const ELEMENT: &'static str;
    const KEYS: &'static [&'static str];
}

macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident as $element:tt {
            $( $variant:ident($ty:ty) => $key:tt ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub enum $name {
            $( #[serde(rename = $key)] $variant($ty) ),+
        }

        impl Choice for $name {
            const ELEMENT: &'static str = $element;
            const KEYS: &'static [&'static str] = &[$($key),+];
        }
    };
}

/// Decode the choice `T` out of the parent's remaining keys.
///
/// Keys that belong to no variant of `T` are left alone; they are either
/// another choice's or unknown to the model.
fn decode<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Choice,
{
    let rest = Map::<String, JsonValue>::deserialize(deserializer)?;
    let mut present = rest.into_iter().filter(|(key, _)| T::KEYS.contains(&key.as_str()));

    let Some((key, value)) = present.next() else {
        return Ok(None);
    };
    let others: Vec<String> = present.map(|(other, _)| other).collect();
    if !others.is_empty() {
        return Err(D::Error::custom(format!(
            "{} allows one value, found {key} and {}",
            T::ELEMENT,
            others.join(", ")
        )));
    }

    let mut tagged = Map::with_capacity(1);
    tagged.insert(key.clone(), value);
    serde_json::from_value(JsonValue::Object(tagged))
        .map(Some)
        .map_err(|e| D::Error::custom(format!("{key}: {e}")))
}

/// For optional `[x]` elements (`0..1`)
pub(crate) fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Choice,
{
    decode(deserializer)
}

/// For mandatory `[x]` elements (`1..1`)
pub(crate) fn required<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Choice,
{
    decode(deserializer)?.ok_or_else(|| D::Error::custom(format!("missing {}", T::ELEMENT)))
}

choice_enum! {
    /// `Observation.value[x]`
    ObservationValue as "value[x]" {
        Quantity(Quantity) => "valueQuantity",
        CodeableConcept(CodeableConcept) => "valueCodeableConcept",
        String(String) => "valueString",
        Boolean(bool) => "valueBoolean",
        Integer(i64) => "valueInteger",
        Range(Range) => "valueRange",
        Ratio(Ratio) => "valueRatio",
        SampledData(SampledData) => "valueSampledData",
        Time(String) => "valueTime",
        DateTime(FhirDateTime) => "valueDateTime",
        Period(Period) => "valuePeriod",
    }
}

impl ObservationValue {
    /// Human readable rendering used in event payloads and DTOs
    pub fn render(&self) -> String {
        match self {
            ObservationValue::Quantity(q) => render_quantity(q),
            ObservationValue::CodeableConcept(cc) => cc
                .text
                .clone()
                .or_else(|| cc.coding.iter().find_map(|c| c.display.clone()))
                .unwrap_or_default(),
            ObservationValue::String(s) | ObservationValue::Time(s) => s.clone(),
            ObservationValue::Boolean(b) => b.to_string(),
            ObservationValue::Integer(i) => i.to_string(),
            ObservationValue::Range(r) => format!(
                "{} - {}",
                r.low.as_ref().map(render_quantity).unwrap_or_default(),
                r.high.as_ref().map(render_quantity).unwrap_or_default()
            ),
            ObservationValue::Ratio(r) => format!(
                "{}/{}",
                r.numerator.as_ref().map(render_quantity).unwrap_or_default(),
                r.denominator.as_ref().map(render_quantity).unwrap_or_default()
            ),
            ObservationValue::SampledData(s) => s.data.clone().unwrap_or_default(),
            ObservationValue::DateTime(dt) => dt.to_string(),
            ObservationValue::Period(p) => format!(
                "{} - {}",
                p.start.as_ref().map(ToString::to_string).unwrap_or_default(),
                p.end.as_ref().map(ToString::to_string).unwrap_or_default()
            ),
        }
    }
}

fn render_quantity(q: &Quantity) -> String {
    let value = q.value.map(|v| v.to_string()).unwrap_or_default();
    match &q.unit {
        Some(unit) => format!("{value} {unit}"),
        None => value,
    }
}

choice_enum! {
    /// `Observation.effective[x]`
    Effective as "effective[x]" {
        DateTime(FhirDateTime) => "effectiveDateTime",
        Period(Period) => "effectivePeriod",
        Timing(Timing) => "effectiveTiming",
        Instant(FhirDateTime) => "effectiveInstant",
    }
}

impl Effective {
    /// The point in time this effective value sorts by
    pub fn sort_key(&self) -> Option<&FhirDateTime> {
        match self {
            Effective::DateTime(dt) | Effective::Instant(dt) => Some(dt),
            Effective::Period(p) => p.start.as_ref(),
            Effective::Timing(t) => t.event.first(),
        }
    }
}

choice_enum! {
    /// `Condition.onset[x]` and `AllergyIntolerance.onset[x]`
    Onset as "onset[x]" {
        DateTime(FhirDateTime) => "onsetDateTime",
        Age(Age) => "onsetAge",
        Period(Period) => "onsetPeriod",
        Range(Range) => "onsetRange",
        String(String) => "onsetString",
    }
}

choice_enum! {
    /// `Condition.abatement[x]`
    Abatement as "abatement[x]" {
        DateTime(FhirDateTime) => "abatementDateTime",
        Age(Age) => "abatementAge",
        Period(Period) => "abatementPeriod",
        Range(Range) => "abatementRange",
        String(String) => "abatementString",
    }
}

choice_enum! {
    Dose as "dose[x]" {
        Range(Range) => "doseRange",
        Quantity(Quantity) => "doseQuantity",
    }
}

choice_enum! {
    Rate as "rate[x]" {
        Ratio(Ratio) => "rateRatio",
        Range(Range) => "rateRange",
        Quantity(Quantity) => "rateQuantity",
    }
}

choice_enum! {
    AsNeeded as "asNeeded[x]" {
        Boolean(bool) => "asNeededBoolean",
        CodeableConcept(CodeableConcept) => "asNeededCodeableConcept",
    }
}

choice_enum! {
    TimingBounds as "bounds[x]" {
        Duration(Duration) => "boundsDuration",
        Range(Range) => "boundsRange",
        Period(Period) => "boundsPeriod",
    }
}

choice_enum! {
    AnnotationAuthor as "author[x]" {
        Reference(Reference) => "authorReference",
        String(String) => "authorString",
    }
}

choice_enum! {
    UsageContextValue as "value[x]" {
        CodeableConcept(CodeableConcept) => "valueCodeableConcept",
        Quantity(Quantity) => "valueQuantity",
        Range(Range) => "valueRange",
        Reference(Reference) => "valueReference",
    }
}

choice_enum! {
    DataRequirementSubject as "subject[x]" {
        CodeableConcept(CodeableConcept) => "subjectCodeableConcept",
        Reference(Reference) => "subjectReference",
    }
}

choice_enum! {
    DateFilterValue as "value[x]" {
        DateTime(FhirDateTime) => "valueDateTime",
        Period(Period) => "valuePeriod",
        Duration(Duration) => "valueDuration",
    }
}

choice_enum! {
    /// `Patient.deceased[x]`
    Deceased as "deceased[x]" {
        Boolean(bool) => "deceasedBoolean",
        DateTime(FhirDateTime) => "deceasedDateTime",
    }
}

choice_enum! {
    /// `MedicationStatement.medication[x]`
    Medication as "medication[x]" {
        CodeableConcept(CodeableConcept) => "medicationCodeableConcept",
        Reference(Reference) => "medicationReference",
    }
}

choice_enum! {
    /// `MedicationStatement.effective[x]`
    MedicationEffective as "effective[x]" {
        DateTime(FhirDateTime) => "effectiveDateTime",
        Period(Period) => "effectivePeriod",
    }
}
