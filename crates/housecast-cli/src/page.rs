//! The single HTML page: input form plus an optional predicted price.

const FORM: &str = r#"<!doctype html>
<title>London House Price Prediction</title>
<h2>Predict price</h2>
<form method="post" action="/predict-form">
  <p><label>Floor area (sqm) <input name="floorAreaSqM" required step="any" type="number"></label></p>
  <p><label>Bedrooms <input name="bedrooms" required type="number"></label></p>
  <p><label>Bathrooms <input name="bathrooms" required type="number"></label></p>
  <p><label>Living rooms <input name="livingRooms" required type="number"></label></p>
  <p><label>Property type <input name="propertyType" required type="text" placeholder="Flat"></label></p>
  <p><label>Tenure <input name="tenure" required type="text" placeholder="Leasehold"></label></p>
  <p><label>Current energy rating <input name="currentEnergyRating" required type="text" placeholder="D"></label></p>
  <p><label>Postcode area <input name="postcodeArea" required type="text" placeholder="SW1"></label></p>
  <p><button type="submit">Predict</button></p>
</form>
"#;

/// Render the form, with the predicted price appended when there is one.
pub fn render(prediction: Option<f64>) -> String {
    match prediction {
        None => FORM.to_string(),
        Some(price) => format!(
            "{FORM}<h3>Predicted price: £{}</h3>\n",
            format_price(price)
        ),
    }
}

/// Whole pounds with thousands separators: `1234567.5` → `"1,234,568"`.
pub fn format_price(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if value < 0.0 && grouped != "0" {
        format!("-{grouped}")
    } else {
        grouped
    }
}
