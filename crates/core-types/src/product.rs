use crate::enums::{Brand, Category};
use crate::error::CoreError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::{json, Map, Value};
use std::str::FromStr;

pub const NAME_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 500;

/// Number of fractional digits a price carries at rest.
pub const PRICE_SCALE: u32 = 2;

/// A vehicle in the catalog.
///
/// This is a plain record: persistence is handled by a repository in the
/// `database` crate, and values of this type only live for the duration of a
/// request. `id` is `None` until the product has been stored.
#[derive(Debug, Clone, PartialEq, Eq, Default, sqlx::FromRow)]
pub struct Product {
    pub id: Option<i32>,
    pub name: String,
    pub brand: Brand,
    pub category: Category,
    pub description: String,
    pub price: Decimal,
    pub model_year: i32,
    pub quantity: i32,
}

impl Product {
    /// Produces the JSON record sent to API clients.
    ///
    /// `price` is emitted as its exact decimal string, never as a float.
    pub fn serialize(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "brand": self.brand,
            "category": self.category,
            "description": self.description,
            "price": self.price.to_string(),
            "model_year": self.model_year,
            "quantity": self.quantity,
        })
    }

    /// Populates this product from an untyped JSON record.
    ///
    /// `name`, `description`, `price`, `model_year` and `quantity` are
    /// required. `brand` and `category` keep their current value when absent.
    /// The record is fully validated before any field is assigned, so a
    /// failed call leaves `self` untouched. `id` is never read from the record.
    pub fn deserialize(&mut self, data: &Value) -> Result<&mut Self, CoreError> {
        let record = data.as_object().ok_or_else(|| {
            CoreError::Validation(
                "Invalid product: body of request contained bad or no data".to_string(),
            )
        })?;

        let name = string_field(record, "name", NAME_MAX_LEN)?;
        let description = string_field(record, "description", DESCRIPTION_MAX_LEN)?;
        let price = parse_price(required(record, "price")?)?;
        let model_year = integer_field(record, "model_year")?;
        let quantity = integer_field(record, "quantity")?;

        let brand = match record.get("brand") {
            Some(value) => Some(enum_field::<Brand>(value, "brand")?),
            None => None,
        };
        let category = match record.get("category") {
            Some(value) => Some(enum_field::<Category>(value, "category")?),
            None => None,
        };

        self.name = name;
        self.description = description;
        self.price = price;
        self.model_year = model_year;
        self.quantity = quantity;
        if let Some(brand) = brand {
            self.brand = brand;
        }
        if let Some(category) = category {
            self.category = category;
        }

        Ok(self)
    }
}

/// Rounds a price to cents the way a `NUMERIC(10, 2)` column does, and pins
/// the scale so that `30000` renders as `30000.00`.
pub fn to_cents(price: Decimal) -> Decimal {
    let mut cents =
        price.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    cents.rescale(PRICE_SCALE);
    cents
}

/// Parses a price from a JSON string or number without going through `f64`.
pub fn parse_price(value: &Value) -> Result<Decimal, CoreError> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(bad_data(format!(
                "price must be a string or a number, got {other}"
            )));
        }
    };

    let price = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| CoreError::Validation(format!("Invalid price: {text}")))?;

    if price.is_sign_negative() && !price.is_zero() {
        return Err(CoreError::Validation(format!(
            "Invalid price: {text} must not be negative"
        )));
    }
    Ok(price)
}

fn required<'a>(record: &'a Map<String, Value>, field: &str) -> Result<&'a Value, CoreError> {
    record
        .get(field)
        .ok_or_else(|| CoreError::Validation(format!("Invalid product: missing {field}")))
}

fn string_field(
    record: &Map<String, Value>,
    field: &str,
    max_len: usize,
) -> Result<String, CoreError> {
    let value = required(record, field)?
        .as_str()
        .ok_or_else(|| bad_data(format!("{field} must be a string")))?;

    if value.chars().count() > max_len {
        return Err(CoreError::Validation(format!(
            "Invalid product: {field} must be at most {max_len} characters"
        )));
    }
    Ok(value.to_string())
}

fn integer_field(record: &Map<String, Value>, field: &str) -> Result<i32, CoreError> {
    required(record, field)?
        .as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| bad_data(format!("{field} must be a 32-bit integer")))
}

fn enum_field<T>(value: &Value, field: &str) -> Result<T, CoreError>
where
    T: FromStr<Err = CoreError>,
{
    match value {
        Value::String(name) => name.parse(),
        other => Err(CoreError::Validation(format!("Invalid {field}: {other}"))),
    }
}

fn bad_data(detail: String) -> CoreError {
    CoreError::Validation(format!(
        "Invalid product: body of request contained bad or no data {detail}"
    ))
}
