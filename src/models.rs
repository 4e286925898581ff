//! Records returned by the flights API.
//!
//! Fields are read with tolerant accessors: a missing or mistyped key becomes
//! an empty string (or NaN for prices) instead of a parse failure.

use serde_json::{Map, Value};

use crate::date::{format_flight_date, format_ticket_date, short_time};

pub type JsonObject = Map<String, Value>;

/// Prefix of the hand-off route used to open the ticket detail view.
pub const TICKET_ROUTE: &str = "ticketInfo";

// ============================================================================
// Tolerant Accessors
// ============================================================================

/// Text value of `key`. Numbers and booleans are rendered as JSON text; null,
/// nested values and missing keys give an empty string.
pub fn opt_string(obj: &JsonObject, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Numeric value of `key`, accepting numeric strings. NaN when absent.
pub fn opt_double(obj: &JsonObject, key: &str) -> f64 {
    match obj.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

// ============================================================================
// Flights
// ============================================================================

/// One row of the flight list.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightSummary {
    pub flight_code: String,
    pub departure_date: String,
    pub departure_time: String,
    pub arrival_date: String,
    pub arrival_time: String,
    pub origin_airport: String,
    pub origin_country: String,
    pub status: String,
}

impl FlightSummary {
    pub fn from_json(obj: &JsonObject) -> Self {
        Self {
            flight_code: opt_string(obj, "codigoVuelo"),
            departure_date: opt_string(obj, "fechaSalida"),
            departure_time: opt_string(obj, "horaSalida"),
            arrival_date: opt_string(obj, "fechaLlegada"),
            arrival_time: opt_string(obj, "horaLlegada"),
            origin_airport: opt_string(obj, "aeropuertoOrigen"),
            origin_country: opt_string(obj, "paisOrigen"),
            status: opt_string(obj, "estadoVuelo"),
        }
    }

    pub fn departure_date_formatted(&self) -> String {
        format_flight_date(&self.departure_date)
    }

    pub fn arrival_date_formatted(&self) -> String {
        format_flight_date(&self.arrival_date)
    }

    /// Status with its first letter upper-cased, as shown on the status chip.
    pub fn status_label(&self) -> String {
        let mut chars = self.status.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

// ============================================================================
// Passengers
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PassengerRecord {
    pub name: String,
    pub surname: String,
    pub document: Option<String>,
    pub seat: Option<String>,
}

impl PassengerRecord {
    pub fn from_json(obj: &JsonObject) -> Self {
        Self {
            name: opt_string(obj, "nombre"),
            surname: opt_string(obj, "apellido"),
            document: non_empty(opt_string(obj, "documento")),
            seat: non_empty(opt_string(obj, "asiento")),
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

// ============================================================================
// Tickets
// ============================================================================

/// A passenger's reservation on one flight.
///
/// Empty strings and NaN prices mean the API did not send the field.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketDetail {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub flight_code: String,
    pub reservation_date: String,
    pub departure_date: String,
    pub departure_time: String,
    pub arrival_date: String,
    pub arrival_time: String,
    pub price_usd: f64,
    pub price_pen: f64,
    pub payment_type: String,
}

impl TicketDetail {
    pub fn from_json(obj: &JsonObject) -> Self {
        Self {
            name: opt_string(obj, "nombre"),
            email: opt_string(obj, "email"),
            phone: opt_string(obj, "telefono"),
            flight_code: opt_string(obj, "codigoVuelo"),
            reservation_date: opt_string(obj, "fechaReserva"),
            departure_date: opt_string(obj, "fechaSalida"),
            departure_time: opt_string(obj, "horaSalida"),
            arrival_date: opt_string(obj, "fechaLlegada"),
            arrival_time: opt_string(obj, "horaLlegada"),
            price_usd: opt_double(obj, "precioUSD"),
            price_pen: opt_double(obj, "precioPEN"),
            payment_type: opt_string(obj, "tipoPago"),
        }
    }

    /// Every field as display text, in route order.
    fn route_fields(&self) -> [String; 12] {
        [
            self.name.clone(),
            self.email.clone(),
            self.phone.clone(),
            self.flight_code.clone(),
            self.reservation_date.clone(),
            self.departure_date.clone(),
            self.departure_time.clone(),
            self.arrival_date.clone(),
            self.arrival_time.clone(),
            format_price(self.price_usd),
            format_price(self.price_pen),
            self.payment_type.clone(),
        ]
    }

    /// Serialize into the slash-delimited route handed to the detail view.
    ///
    /// Each segment is percent-encoded so a `/` inside a value cannot shift
    /// the remaining fields.
    pub fn to_route(&self) -> String {
        let mut route = String::from(TICKET_ROUTE);
        for field in self.route_fields() {
            route.push('/');
            route.push_str(&urlencoding::encode(&field));
        }
        route
    }

    /// Rebuild a ticket from a route produced by [`TicketDetail::to_route`].
    ///
    /// Prices go back through text, so anything that does not parse is NaN.
    pub fn from_route(route: &str) -> Option<Self> {
        let mut segments = route.split('/');
        if segments.next()? != TICKET_ROUTE {
            return None;
        }
        let fields = segments
            .map(|s| urlencoding::decode(s).map(|d| d.into_owned()).ok())
            .collect::<Option<Vec<String>>>()?;
        let [name, email, phone, flight_code, reservation_date, departure_date, departure_time, arrival_date, arrival_time, price_usd, price_pen, payment_type] =
            <[String; 12]>::try_from(fields).ok()?;

        Some(Self {
            name,
            email,
            phone,
            flight_code,
            reservation_date,
            departure_date,
            departure_time,
            arrival_date,
            arrival_time,
            price_usd: price_usd.parse().unwrap_or(f64::NAN),
            price_pen: price_pen.parse().unwrap_or(f64::NAN),
            payment_type,
        })
    }

    /// Lines of the ticket detail view. Missing values show as `-`.
    pub fn detail_lines(&self) -> Vec<String> {
        let date = |d: &str| format_ticket_date(Some(d)).unwrap_or_else(|| "-".to_string());
        let price = |p: f64| {
            if p.is_nan() {
                "-".to_string()
            } else {
                format_price(p)
            }
        };
        vec![
            format!("Nombre: {}", dash(&self.name)),
            format!("Email: {}", dash(&self.email)),
            format!("Teléfono: {}", dash(&self.phone)),
            format!("Código Vuelo: {}", dash(&self.flight_code)),
            format!("Salida: {} {}", date(&self.departure_date), short_time(&self.departure_time)),
            format!("Llegada: {} {}", date(&self.arrival_date), short_time(&self.arrival_time)),
            format!("Precio USD: {}", price(self.price_usd)),
            format!("Precio PEN: {}", price(self.price_pen)),
            format!("Tipo de Pago: {}", dash(&self.payment_type)),
            format!("Fecha Reserva: {}", date(&self.reservation_date)),
        ]
    }
}

fn dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

/// Float text with a mandatory fraction (`150.0`), `NaN` for missing prices.
pub fn format_price(price: f64) -> String {
    format!("{:?}", price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> JsonObject {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_opt_string_is_tolerant() {
        let obj = object(json!({"a": "x", "n": 42, "f": 1.5, "b": true, "z": null, "arr": [1]}));
        assert_eq!(opt_string(&obj, "a"), "x");
        assert_eq!(opt_string(&obj, "n"), "42");
        assert_eq!(opt_string(&obj, "f"), "1.5");
        assert_eq!(opt_string(&obj, "b"), "true");
        assert_eq!(opt_string(&obj, "z"), "");
        assert_eq!(opt_string(&obj, "arr"), "");
        assert_eq!(opt_string(&obj, "missing"), "");
    }

    #[test]
    fn test_opt_double_is_tolerant() {
        let obj = object(json!({"n": 120, "s": " 99.5 ", "bad": "abc", "z": null}));
        assert_eq!(opt_double(&obj, "n"), 120.0);
        assert_eq!(opt_double(&obj, "s"), 99.5);
        assert!(opt_double(&obj, "bad").is_nan());
        assert!(opt_double(&obj, "z").is_nan());
        assert!(opt_double(&obj, "missing").is_nan());
    }

    #[test]
    fn test_flight_summary_from_json() {
        let obj = object(json!({
            "codigoVuelo": "LH401",
            "fechaSalida": "2025-06-13T00:00:00",
            "horaSalida": "08:30:00",
            "fechaLlegada": "2025-06-14",
            "horaLlegada": "10:00:00",
            "aeropuertoOrigen": "Jorge Chavez",
            "paisOrigen": "Peru",
            "estadoVuelo": "disponible"
        }));
        let flight = FlightSummary::from_json(&obj);
        assert_eq!(flight.flight_code, "LH401");
        assert_eq!(flight.departure_date_formatted(), "13 Jun 2025");
        assert_eq!(flight.arrival_date_formatted(), "14 Jun 2025");
        assert_eq!(flight.status_label(), "Disponible");
    }

    #[test]
    fn test_passenger_optional_fields() {
        let obj = object(json!({"nombre": "Ana", "apellido": "Rios", "asiento": "12A"}));
        let p = PassengerRecord::from_json(&obj);
        assert_eq!(p.name, "Ana");
        assert_eq!(p.document, None);
        assert_eq!(p.seat.as_deref(), Some("12A"));
    }

    #[test]
    fn test_ticket_missing_keys_default() {
        let ticket = TicketDetail::from_json(&object(json!({"nombre": "Ana"})));
        assert_eq!(ticket.name, "Ana");
        assert_eq!(ticket.email, "");
        assert_eq!(ticket.payment_type, "");
        assert!(ticket.price_usd.is_nan());
        assert!(ticket.price_pen.is_nan());
    }

    #[test]
    fn test_route_round_trip() {
        let ticket = TicketDetail {
            name: "Ana Rios".into(),
            email: "ana@example.com".into(),
            phone: "+51 999".into(),
            flight_code: "XP100".into(),
            reservation_date: "2025-05-01".into(),
            departure_date: "2025-06-13".into(),
            departure_time: "08:30:00".into(),
            arrival_date: "2025-06-13".into(),
            arrival_time: "10:15:00".into(),
            price_usd: 150.0,
            price_pen: 555.25,
            payment_type: "Tarjeta/Visa".into(),
        };
        let route = ticket.to_route();
        assert!(route.starts_with("ticketInfo/Ana%20Rios/"));
        assert!(route.contains("/150.0/555.25/"));
        assert_eq!(TicketDetail::from_route(&route), Some(ticket));
    }

    #[test]
    fn test_route_keeps_nan_prices() {
        let ticket = TicketDetail::from_json(&object(json!({"nombre": "Ana"})));
        let route = ticket.to_route();
        assert!(route.contains("/NaN/NaN/"));
        let back = TicketDetail::from_route(&route).expect("route parses");
        assert!(back.price_usd.is_nan());
        assert_eq!(back.name, "Ana");
    }

    #[test]
    fn test_detail_lines() {
        let ticket = TicketDetail::from_json(&object(json!({
            "nombre": "Ana",
            "codigoVuelo": "XP100",
            "fechaSalida": "2025-06-13T00:00:00",
            "horaSalida": "08:30:00",
            "precioUSD": 150
        })));
        let lines = ticket.detail_lines();
        assert_eq!(lines[0], "Nombre: Ana");
        assert_eq!(lines[1], "Email: -");
        assert_eq!(lines[3], "Código Vuelo: XP100");
        assert_eq!(lines[4], "Salida: 13 Jun 2025 08:30");
        assert_eq!(lines[5], "Llegada: - ");
        assert_eq!(lines[6], "Precio USD: 150.0");
        assert_eq!(lines[7], "Precio PEN: -");
        assert_eq!(lines[9], "Fecha Reserva: -");
    }

    #[test]
    fn test_route_rejects_wrong_shape() {
        assert_eq!(TicketDetail::from_route("pasajeros/XP100"), None);
        assert_eq!(TicketDetail::from_route("ticketInfo/a/b"), None);
    }
}
