use std::process::ExitCode;

use anyhow::{Context, Result, ensure};
use colored::Colorize;
use json_prebake::{
    Codec, CodecError, FieldReader, GeneratorOptions, Property, Record, SchemaModel, Session, Shaped, TypeDecl,
    TypeShape, Value,
};

#[derive(Debug, Clone, PartialEq)]
struct Person {
    name: Option<String>,
    age: i64,
    county: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct Chapter {
    name: Option<String>,
    page_begin: i64,
    page_end: i64,
}

#[derive(Debug, Clone, PartialEq)]
struct Book {
    title: Option<String>,
    authors: Option<Vec<Person>>,
    chapters: Option<Vec<Chapter>>,
    total_page_count: i64,
    price: i64,
}

impl Shaped for Person {
    fn shape() -> TypeShape {
        TypeShape::object("Person").with_nullable(false)
    }
    fn to_value(&self) -> Value {
        Record::new("Person")
            .field(self.name.to_value())
            .field(self.age.to_value())
            .field(self.county.to_value())
            .into()
    }
    fn from_value(value: Value) -> Result<Self, CodecError> {
        let mut fields = FieldReader::open(value, "Person")?;
        Ok(Person { name: fields.next()?, age: fields.next()?, county: fields.next()? })
    }
}

impl Shaped for Chapter {
    fn shape() -> TypeShape {
        TypeShape::object("Chapter").with_nullable(false)
    }
    fn to_value(&self) -> Value {
        Record::new("Chapter")
            .field(self.name.to_value())
            .field(self.page_begin.to_value())
            .field(self.page_end.to_value())
            .into()
    }
    fn from_value(value: Value) -> Result<Self, CodecError> {
        let mut fields = FieldReader::open(value, "Chapter")?;
        Ok(Chapter { name: fields.next()?, page_begin: fields.next()?, page_end: fields.next()? })
    }
}

impl Shaped for Book {
    fn shape() -> TypeShape {
        TypeShape::object("Book").with_nullable(false)
    }
    fn to_value(&self) -> Value {
        Record::new("Book")
            .field(self.title.to_value())
            .field(self.authors.to_value())
            .field(self.chapters.to_value())
            .field(self.total_page_count.to_value())
            .field(self.price.to_value())
            .into()
    }
    fn from_value(value: Value) -> Result<Self, CodecError> {
        let mut fields = FieldReader::open(value, "Book")?;
        Ok(Book {
            title: fields.next()?,
            authors: fields.next()?,
            chapters: fields.next()?,
            total_page_count: fields.next()?,
            price: fields.next()?,
        })
    }
}

fn schema() -> Result<SchemaModel> {
    let mut model = SchemaModel::new()
        .with_type(
            TypeDecl::new("Book")
                .property(Property::new("Title", TypeShape::string()))
                .property(Property::new("Authors", TypeShape::list(TypeShape::object("Person"))).items_not_null())
                .property(Property::new("Chapters", TypeShape::list(TypeShape::object("Chapter"))).items_not_null())
                .property(Property::new("TotalPageCount", TypeShape::int()))
                .property(Property::new("Price", TypeShape::int())),
        )?
        .with_type(
            TypeDecl::new("Person")
                .property(Property::new("Name", TypeShape::string()))
                .property(Property::new("Age", TypeShape::int()))
                .property(Property::new("County", TypeShape::string())),
        )?
        .with_type(
            TypeDecl::new("Chapter")
                .property(Property::new("Name", TypeShape::string()))
                .property(Property::new("PageBegin", TypeShape::int()))
                .property(Property::new("PageEnd", TypeShape::int())),
        )?;
    model.invoke_both(Book::shape());
    model.invoke_both(Option::<Book>::shape());
    Ok(model)
}

fn sample_book() -> Book {
    let person = |name: &str, age, county: &str| Person { name: Some(name.into()), age, county: Some(county.into()) };
    Book {
        title: Some("The Great Voyage".into()),
        authors: Some(vec![person("Author A", 53, "United States"), person("Author B", 47, "Canada")]),
        chapters: Some(
            (1..=3)
                .map(|i| Chapter { name: Some(format!("Chapter {i}")), page_begin: 5, page_end: 10 })
                .collect(),
        ),
        total_page_count: 300,
        price: 50,
    }
}

fn book_round_trip(codec: &Codec) -> Result<()> {
    let book = sample_book();
    let text = codec.serialize_as(&book)?;
    let back: Book = codec.deserialize_as(&text)?;
    ensure!(back == book, "decoded book differs:\n{text}");
    Ok(())
}

fn output_is_standard_json(codec: &Codec) -> Result<()> {
    let text = codec.serialize_as(&sample_book())?;
    let parsed: serde_json::Value = serde_json::from_str(&text).context("serde_json rejected the output")?;
    ensure!(parsed["Authors"][1]["County"] == "Canada", "unexpected document: {parsed}");
    Ok(())
}

fn null_book(codec: &Codec) -> Result<()> {
    ensure!(codec.serialize_as(&None::<Book>)? == "null");
    ensure!(codec.deserialize_as::<Option<Book>>("null")?.is_none());
    ensure!(codec.deserialize_as::<Option<Book>>("  ")?.is_none(), "blank input should read as null");
    Ok(())
}

fn unknown_properties(codec: &Codec) -> Result<()> {
    let back: Book = codec.deserialize_as(r#"{"Price": 7, "Publisher": {"Name": "X"}, "Title": "T"}"#)?;
    ensure!(back.price == 7 && back.title.as_deref() == Some("T"), "unexpected book: {back:?}");
    Ok(())
}

const CASES: &[(&str, fn(&Codec) -> Result<()>)] = &[
    ("book round trip", book_round_trip),
    ("output is standard JSON", output_is_standard_json),
    ("null book", null_book),
    ("unknown properties", unknown_properties),
];

fn main() -> Result<ExitCode> {
    let model = schema()?;
    let generation = Session::new(&model, GeneratorOptions::default()).run();
    for diagnostic in &generation.diagnostics {
        eprintln!("{diagnostic}");
    }
    eprintln!("{} routines", generation.codec.routines().len());

    let mut failed = 0;
    for (name, case) in CASES {
        match case(&generation.codec) {
            Ok(()) => eprintln!("✅ {}", name.green()),
            Err(error) => {
                failed += 1;
                eprintln!("❌ {}: {error:#}", name.red());
            }
        }
    }
    Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
