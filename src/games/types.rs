use crate::errors::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side a player can bet on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BetChoice {
    /// High: totals 11 through 17
    Tai,
    /// Low: totals 4 through 10
    Xiu,
}

impl BetChoice {
    /// Parse the wire form. Only the exact lowercase names are accepted.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        match raw {
            "tai" => Ok(BetChoice::Tai),
            "xiu" => Ok(BetChoice::Xiu),
            other => Err(ValidationError::InvalidChoice(other.to_string())),
        }
    }
}

impl fmt::Display for BetChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetChoice::Tai => write!(f, "tai"),
            BetChoice::Xiu => write!(f, "xiu"),
        }
    }
}

/// Classified result of a round
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoundResult {
    Tai,
    Xiu,
    Triple,
    /// Never produced by a valid roll; kept so the classifier is total
    Unknown,
}

impl RoundResult {
    /// The bettable side this result pays, if any
    pub fn winning_side(self) -> Option<BetChoice> {
        match self {
            RoundResult::Tai => Some(BetChoice::Tai),
            RoundResult::Xiu => Some(BetChoice::Xiu),
            RoundResult::Triple | RoundResult::Unknown => None,
        }
    }
}

impl fmt::Display for RoundResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundResult::Tai => write!(f, "TAI"),
            RoundResult::Xiu => write!(f, "XIU"),
            RoundResult::Triple => write!(f, "TRIPLE"),
            RoundResult::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Three die faces, each in 1..=6
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "[u8; 3]", into = "[u8; 3]")]
pub struct Dice([u8; 3]);

impl Dice {
    pub const FACES: u8 = 6;

    pub fn new(d1: u8, d2: u8, d3: u8) -> Result<Self, String> {
        for face in [d1, d2, d3] {
            if !(1..=Self::FACES).contains(&face) {
                return Err(format!("die face {} out of range 1..=6", face));
            }
        }
        Ok(Self([d1, d2, d3]))
    }

    pub fn faces(&self) -> [u8; 3] {
        self.0
    }

    /// Every ordered roll of three dice (216 outcomes)
    pub fn all() -> impl Iterator<Item = Dice> {
        (1..=Self::FACES).flat_map(|a| {
            (1..=Self::FACES).flat_map(move |b| (1..=Self::FACES).map(move |c| Dice([a, b, c])))
        })
    }
}

impl TryFrom<[u8; 3]> for Dice {
    type Error = String;

    fn try_from(value: [u8; 3]) -> Result<Self, Self::Error> {
        Dice::new(value[0], value[1], value[2])
    }
}

impl From<Dice> for [u8; 3] {
    fn from(dice: Dice) -> Self {
        dice.0
    }
}

/// Validated reference to an account supplied by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct AccountHandle(String);

impl AccountHandle {
    pub const MAX_LEN: usize = 64;

    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let valid = !raw.is_empty()
            && raw.len() <= Self::MAX_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(ValidationError::InvalidHandle(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccountHandle {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AccountHandle::parse(&value)
    }
}

impl From<AccountHandle> for String {
    fn from(handle: AccountHandle) -> Self {
        handle.0
    }
}

impl fmt::Display for AccountHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Player account. Mutated only by settlements and the admin top-up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub handle: AccountHandle,
    /// Smallest currency unit
    pub balance: u64,
    /// Number of settled rounds; the next record gets this value as its sequence
    pub bet_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn open(handle: AccountHandle, start_balance: u64) -> Self {
        let now = Utc::now();
        Self {
            handle,
            balance: start_balance,
            bet_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Immutable ledger entry for one settled round
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BetRecord {
    pub bet_id: String,
    pub account: AccountHandle,
    /// Position in the account's history, starting at 0
    pub sequence: u64,
    pub amount: u64,
    pub choice: BetChoice,
    pub dice: Dice,
    pub total: u8,
    pub triple: bool,
    pub result: RoundResult,
    pub won: bool,
    pub balance_after: u64,
    pub created_at: DateTime<Utc>,
}

impl BetRecord {
    /// Whether `won` agrees with the resolution rule for (choice, result)
    pub fn is_consistent(&self) -> bool {
        self.won == (self.result.winning_side() == Some(self.choice))
    }
}

/// Validated bet request: a side and a positive wager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BetTicket {
    pub choice: BetChoice,
    pub amount: u64,
}

impl BetTicket {
    /// Build a ticket from the loosely-typed wire request.
    ///
    /// The amount may be a JSON integer or a string of decimal digits.
    pub fn from_request(request: &PlaceBetRequest) -> Result<Self, ValidationError> {
        let choice = BetChoice::parse(&request.choice)?;
        let amount = parse_amount(&request.amount)?;
        Ok(Self { choice, amount })
    }
}

fn parse_amount(raw: &serde_json::Value) -> Result<u64, ValidationError> {
    let invalid = || ValidationError::InvalidAmount(raw.to_string());
    let amount = match raw {
        serde_json::Value::Number(n) => n.as_u64().ok_or_else(invalid)?,
        serde_json::Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            s.parse::<u64>().map_err(|_| invalid())?
        }
        _ => return Err(invalid()),
    };
    if amount == 0 {
        return Err(invalid());
    }
    Ok(amount)
}

/// Bet placement request as received on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceBetRequest {
    #[serde(default)]
    pub choice: String,
    #[serde(default)]
    pub amount: serde_json::Value,
}

/// Result returned to the player after a successful settlement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BetReceipt {
    pub dice: Dice,
    pub total: u8,
    pub triple: bool,
    pub result: RoundResult,
    pub won: bool,
    pub balance: u64,
    pub bet_id: String,
}

impl From<&BetRecord> for BetReceipt {
    fn from(record: &BetRecord) -> Self {
        Self {
            dice: record.dice,
            total: record.total,
            triple: record.triple,
            result: record.result,
            won: record.won,
            balance: record.balance_after,
            bet_id: record.bet_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(choice: &str, amount: serde_json::Value) -> PlaceBetRequest {
        PlaceBetRequest { choice: choice.to_string(), amount }
    }

    #[test]
    fn test_choice_is_strict() {
        assert_eq!(BetChoice::parse("tai").unwrap(), BetChoice::Tai);
        assert_eq!(BetChoice::parse("xiu").unwrap(), BetChoice::Xiu);
        assert!(BetChoice::parse("TAI").is_err());
        assert!(BetChoice::parse("").is_err());
    }

    #[test]
    fn test_ticket_amounts() {
        assert_eq!(BetTicket::from_request(&request("tai", json!(100))).unwrap().amount, 100);
        assert_eq!(BetTicket::from_request(&request("xiu", json!("250"))).unwrap().amount, 250);

        for bad in [json!(0), json!(-5), json!(1.5), json!("12abc"), json!(""), json!(null), json!([1])] {
            let err = BetTicket::from_request(&request("tai", bad.clone())).unwrap_err();
            assert!(matches!(err, ValidationError::InvalidAmount(_)), "accepted {}", bad);
        }
    }

    #[test]
    fn test_dice_range() {
        assert!(Dice::new(1, 6, 3).is_ok());
        assert!(Dice::new(0, 1, 1).is_err());
        assert!(Dice::new(1, 7, 1).is_err());
        assert_eq!(Dice::all().count(), 216);

        let parsed: Result<Dice, _> = serde_json::from_value(json!([2, 9, 1]));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_account_handle() {
        assert!(AccountHandle::parse("player_01.test-a").is_ok());
        assert!(AccountHandle::parse("").is_err());
        assert!(AccountHandle::parse("has space").is_err());
        assert!(AccountHandle::parse("colon:sep").is_err());
        assert!(AccountHandle::parse(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_receipt_wire_shape() {
        let record = BetRecord {
            bet_id: "b1".to_string(),
            account: AccountHandle::parse("alice").unwrap(),
            sequence: 0,
            amount: 200,
            choice: BetChoice::Tai,
            dice: Dice::new(4, 5, 6).unwrap(),
            total: 15,
            triple: false,
            result: RoundResult::Tai,
            won: true,
            balance_after: 1200,
            created_at: Utc::now(),
        };
        assert!(record.is_consistent());

        let value = serde_json::to_value(BetReceipt::from(&record)).unwrap();
        assert_eq!(
            value,
            json!({
                "dice": [4, 5, 6],
                "total": 15,
                "triple": false,
                "result": "TAI",
                "won": true,
                "balance": 1200,
                "betId": "b1"
            })
        );
    }
}
