use pretty_assertions::assert_eq;
use rison::de::{UnkeyedDecoder, ValueDecoder};
use rison::ser::{UnkeyedEncoder, ValueEncoder};
use rison::{Decoder, Encoder, Mode, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq)]
struct Person {
    name: String,
}

#[derive(Debug, PartialEq)]
struct Employee {
    employee_id: String,
    person: Person,
}

impl Person {
    fn decode(decoder: ValueDecoder<'_>) -> rison::Result<Self> {
        let keyed = decoder.keyed()?;
        Ok(Person {
            name: keyed.decode("name")?,
        })
    }

    fn encode(&self, encoder: ValueEncoder<'_>) -> rison::Result<()> {
        encoder.keyed().encode("name", &self.name)
    }

    fn decode_unkeyed(decoder: &mut UnkeyedDecoder<'_>) -> rison::Result<Self> {
        Ok(Person {
            name: decoder.decode()?,
        })
    }

    fn encode_unkeyed(&self, encoder: &mut UnkeyedEncoder<'_>) -> rison::Result<()> {
        encoder.encode(&self.name)
    }
}

impl Employee {
    fn decode(decoder: ValueDecoder<'_>, super_key: Option<&str>) -> rison::Result<Self> {
        let keyed = decoder.keyed()?;
        let parent = match super_key {
            Some(key) => keyed.super_decoder_for_key(key)?,
            None => keyed.super_decoder()?,
        };
        Ok(Employee {
            employee_id: keyed.decode("emp_id")?,
            person: Person::decode(parent)?,
        })
    }

    fn encode(&self, encoder: ValueEncoder<'_>, super_key: Option<&str>) -> rison::Result<()> {
        let mut keyed = encoder.keyed();
        keyed.encode("emp_id", &self.employee_id)?;
        let parent = match super_key {
            Some(key) => keyed.super_encoder_for_key(key)?,
            None => keyed.super_encoder()?,
        };
        self.person.encode(parent)
    }

    fn decode_unkeyed(decoder: ValueDecoder<'_>) -> rison::Result<Self> {
        let mut unkeyed = decoder.unkeyed()?;
        let mut parent = unkeyed.super_decoder()?.unkeyed()?;
        Ok(Employee {
            person: Person::decode_unkeyed(&mut parent)?,
            employee_id: unkeyed.decode()?,
        })
    }

    fn encode_unkeyed(&self, encoder: ValueEncoder<'_>) -> rison::Result<()> {
        let mut unkeyed = encoder.unkeyed();
        self.person
            .encode_unkeyed(&mut unkeyed.super_encoder().unkeyed())?;
        unkeyed.encode(&self.employee_id)
    }
}

fn employee() -> Employee {
    Employee {
        employee_id: "I".into(),
        person: Person { name: "N".into() },
    }
}

#[test]
fn hierarchy_with_default_key() {
    let mut decoder = Decoder::new("(emp_id:I,super:(name:N))", Mode::Standard);
    let decoded = Employee::decode(decoder.root().unwrap(), None).unwrap();
    assert_eq!(decoded, employee());

    let mut encoder = Encoder::new(Mode::Standard);
    employee().encode(encoder.root(), None).unwrap();
    assert_eq!(encoder.to_text(), "(emp_id:I,super:(name:N))");
}

#[test]
fn hierarchy_with_custom_key() {
    let mut decoder = Decoder::new("(emp_id:I,person:(name:N))", Mode::Standard);
    let decoded = Employee::decode(decoder.root().unwrap(), Some("person")).unwrap();
    assert_eq!(decoded, employee());

    let mut encoder = Encoder::new(Mode::Standard);
    employee().encode(encoder.root(), Some("person")).unwrap();
    assert_eq!(encoder.to_text(), "(emp_id:I,person:(name:N))");
}

#[test]
fn hierarchy_missing_super_key() {
    let mut decoder = Decoder::new("(emp_id:I,person:(name:N))", Mode::Standard);
    let err = Employee::decode(decoder.root().unwrap(), None).unwrap_err();

    assert_eq!(err.to_string(), "key not found: `super`");
}

#[test]
fn unkeyed_hierarchy() {
    let mut encoder = Encoder::new(Mode::Standard);
    employee().encode_unkeyed(encoder.root()).unwrap();
    let text = encoder.to_text();
    assert_eq!(text, "!(!(N),I)");

    let mut decoder = Decoder::new(text, Mode::Standard);
    let decoded = Employee::decode_unkeyed(decoder.root().unwrap()).unwrap();
    assert_eq!(decoded, employee());
}

#[test]
fn unkeyed_hierarchy_mock_values() {
    let mut decoder = Decoder::new("!(!(mockName),mockID)", Mode::Standard);
    let decoded = Employee::decode_unkeyed(decoder.root().unwrap()).unwrap();

    assert_eq!(decoded.person.name, "mockName");
    assert_eq!(decoded.employee_id, "mockID");
}

#[test]
fn serde_hierarchy() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Person {
        name: String,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Employee {
        emp_id: String,
        #[serde(rename = "super")]
        person: Person,
    }

    let text = "(emp_id:I,super:(name:N))";
    let employee: Employee = rison::from_str(text).unwrap();
    assert_eq!(employee.person.name, "N");
    assert_eq!(rison::to_string(&employee).unwrap(), text);
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Contact {
    array: Vec<u8>,
    email: String,
}

#[test]
fn mode_transparency() {
    let contact = Contact {
        array: vec![1, 2, 3],
        email: "x".into(),
    };

    let standard = rison::to_string(&contact).unwrap();
    let object = rison::to_string_with_mode(&contact, Mode::Object).unwrap();
    assert_eq!(standard, "(array:!(1,2,3),email:x)");
    assert_eq!(object, "array:!(1,2,3),email:x");

    let back: Contact = rison::from_str_with_mode(&object, Mode::Object).unwrap();
    assert_eq!(back, contact);
    assert_eq!(
        rison::parse_with_mode(&object, Mode::Object).unwrap(),
        rison::parse(&standard).unwrap()
    );
}

#[test]
fn array_mode_round_trip() {
    let values = vec![Contact {
        array: vec![],
        email: "a@b".into(),
    }];

    let text = rison::to_string_with_mode(&values, Mode::Array).unwrap();
    assert_eq!(text, "(array:!(),email:'a@b')");

    let back: Vec<Contact> = rison::from_str_with_mode(&text, Mode::Array).unwrap();
    assert_eq!(back, values);
}

#[test]
fn enums() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    #[serde(rename_all = "lowercase")]
    enum State {
        Active,
        Canceled,
        Moved { to: String },
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Order {
        state: State,
    }

    let order: Order = rison::from_str("(state:canceled)").unwrap();
    assert_eq!(order.state, State::Canceled);
    assert_eq!(rison::to_string(&order).unwrap(), "(state:canceled)");

    let moved: State = rison::from_str("(moved:(to:x))").unwrap();
    assert_eq!(moved, State::Moved { to: "x".into() });

    assert!(rison::from_str::<State>("paused").is_err());
    assert_eq!(rison::to_string(&State::Active).unwrap(), "active");
}

#[test]
fn narrowing() {
    assert_eq!(rison::from_str::<i8>("-8").unwrap(), -8);
    assert_eq!(rison::from_str::<u16>("300").unwrap(), 300);
    assert_eq!(rison::from_str::<u64>("1e3").unwrap(), 1000);

    let err = rison::from_str::<u8>("300").unwrap_err();
    assert!(err.is_data());
    assert_eq!(err.to_string(), "number out of range: 300 does not fit in u8");

    assert!(rison::from_str::<u32>("-1").is_err());
    assert!(rison::from_str::<i32>("1.5").is_err());
    assert_eq!(rison::from_str::<f32>("1.5").unwrap(), 1.5);
    assert!(rison::from_str::<f32>("1e-50").unwrap_err().is_data());
    assert_eq!(rison::from_str::<f64>("1e-50").unwrap(), 1e-50);

    let mut decoder = Decoder::new("1e-50", Mode::Standard);
    assert!(decoder.single_value().unwrap().decode_f32().is_err());
}

#[test]
fn decode_errors_carry_the_path() {
    #[derive(Deserialize, Debug)]
    #[allow(dead_code)]
    struct Team {
        people: Vec<Contact>,
    }

    let err = rison::from_str::<Team>("(people:!((array:!(),email:x),(array:!(1,x),email:y)))")
        .unwrap_err();

    assert_eq!(
        err.path().map(ToString::to_string).as_deref(),
        Some("people[1].array[1]")
    );
}

#[test]
fn encode_then_parse_quoted_strings() {
    let text = rison::to_string(&vec!["it's", "a b", "!t", "", "-1"]).unwrap();
    assert_eq!(text, "!('it!'s','a b','!!t','','-1')");

    let value = rison::parse(&text).unwrap();
    assert_eq!(
        value,
        Value::Array(vec![
            "it's".into(),
            "a b".into(),
            "!t".into(),
            "".into(),
            "-1".into(),
        ])
    );
}

#[test]
fn syntax_errors() {
    let err = rison::parse("(a:1,,b:2)").unwrap_err();
    assert!(err.is_syntax());
    assert_eq!(err.to_string(), "extra ',' at position 5");

    assert!(rison::parse("").unwrap_err().is_eof());
    assert!(rison::parse("'abc").unwrap_err().is_eof());
    assert!(rison::from_str::<Vec<u8>>("!(1,2").unwrap_err().is_eof());
}
