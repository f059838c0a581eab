#![allow(dead_code)]

use json_prebake::{
    Codec, CodecError, FieldReader, GeneratorOptions, Property, Record, SchemaModel, Session, Shaped, TypeDecl,
    TypeShape, Value,
};

// ————————————————————————————————————————————————————————————————————————————
// SCHEMA
// ————————————————————————————————————————————————————————————————————————————

pub fn declare_samples(model: &mut SchemaModel) {
    let decls = [
        TypeDecl::new("SimpleObj")
            .property(Property::new("PropertyString", TypeShape::string()))
            .property(Property::new("PropertyInt", TypeShape::int()))
            .property(Property::new("PropertyObj", TypeShape::object("SimpleSubObj")))
            .property(Property::new("PropertyListString", TypeShape::list(TypeShape::string())))
            .property(Property::new("PropertyListInt", TypeShape::list(TypeShape::int())))
            .property(Property::new("PropertyListObj", TypeShape::list(TypeShape::object("SimpleSubObj")))),
        TypeDecl::new("SimpleSubObj").property(Property::new("PropertyString", TypeShape::string())),
        TypeDecl::new("EmptyObj"),
        TypeDecl::new("Book")
            .property(Property::new("Title", TypeShape::string()))
            .property(Property::new("Authors", TypeShape::list(TypeShape::object("Person"))).items_not_null())
            .property(Property::new("Chapters", TypeShape::list(TypeShape::object("Chapter"))).items_not_null())
            .property(Property::new("TotalPageCount", TypeShape::int()))
            .property(Property::new("Price", TypeShape::int())),
        TypeDecl::new("Person")
            .property(Property::new("Name", TypeShape::string()))
            .property(Property::new("Age", TypeShape::int()))
            .property(Property::new("County", TypeShape::string())),
        TypeDecl::new("Chapter")
            .property(Property::new("Name", TypeShape::string()))
            .property(Property::new("PageBegin", TypeShape::int()))
            .property(Property::new("PageEnd", TypeShape::int())),
    ];
    for decl in decls {
        model.declare(decl).unwrap();
    }
}

/// Sample types plus a call site in both directions for every shape the
/// tests use.
pub fn model() -> SchemaModel {
    let mut model = SchemaModel::new();
    declare_samples(&mut model);
    for shape in [
        TypeShape::int(),
        TypeShape::string(),
        TypeShape::list(TypeShape::int()).with_nullable(false),
        TypeShape::list(TypeShape::string()),
        TypeShape::object("SimpleObj"),
        TypeShape::object("SimpleSubObj"),
        TypeShape::object("EmptyObj"),
        TypeShape::object("Book"),
        TypeShape::list(TypeShape::object("Person")),
    ] {
        model.invoke_both(shape);
    }
    model
}

pub fn codec() -> Codec {
    let model = model();
    let generation = Session::new(&model, GeneratorOptions::default()).run();
    assert!(generation.diagnostics.is_empty(), "{:?}", generation.diagnostics);
    generation.codec
}

/// `Node { Label: string, Children: list<Node!> }`, invoked both ways.
pub fn node_codec() -> Codec {
    let mut model = SchemaModel::new()
        .with_type(
            TypeDecl::new("Node")
                .property(Property::new("Label", TypeShape::string()))
                .property(Property::new("Children", TypeShape::list(TypeShape::object("Node"))).items_not_null()),
        )
        .unwrap();
    model.invoke_both(TypeShape::object("Node"));
    let generation = Session::new(&model, GeneratorOptions::default()).run();
    assert!(generation.diagnostics.is_empty(), "{:?}", generation.diagnostics);
    generation.codec
}

/// A chain of `levels` nodes, each the only child of the one above.
pub fn node_chain(levels: usize) -> Value {
    let leaf = Record::new("Node").field(Value::Null).field(Value::Null);
    (1..levels)
        .fold(leaf, |child, _| Record::new("Node").field(Value::Null).field(Value::List(vec![child.into()])))
        .into()
}

// ————————————————————————————————————————————————————————————————————————————
// TYPED RECORDS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimpleSubObj {
    pub property_string: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimpleObj {
    pub property_string: Option<String>,
    pub property_int: i64,
    pub property_obj: Option<SimpleSubObj>,
    pub property_list_string: Option<Vec<Option<String>>>,
    pub property_list_int: Option<Vec<i64>>,
    pub property_list_obj: Option<Vec<Option<SimpleSubObj>>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmptyObj;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub name: Option<String>,
    pub age: i64,
    pub county: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chapter {
    pub name: Option<String>,
    pub page_begin: i64,
    pub page_end: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Book {
    pub title: Option<String>,
    pub authors: Option<Vec<Person>>,
    pub chapters: Option<Vec<Chapter>>,
    pub total_page_count: i64,
    pub price: i64,
}

impl Shaped for SimpleSubObj {
    fn shape() -> TypeShape {
        TypeShape::object("SimpleSubObj")
    }
    fn to_value(&self) -> Value {
        Record::new("SimpleSubObj").field(self.property_string.to_value()).into()
    }
    fn from_value(value: Value) -> Result<Self, CodecError> {
        let mut fields = FieldReader::open(value, "SimpleSubObj")?;
        Ok(Self { property_string: fields.next()? })
    }
}

impl Shaped for SimpleObj {
    fn shape() -> TypeShape {
        TypeShape::object("SimpleObj")
    }
    fn to_value(&self) -> Value {
        Record::new("SimpleObj")
            .field(self.property_string.to_value())
            .field(self.property_int.to_value())
            .field(self.property_obj.to_value())
            .field(self.property_list_string.to_value())
            .field(self.property_list_int.to_value())
            .field(self.property_list_obj.to_value())
            .into()
    }
    fn from_value(value: Value) -> Result<Self, CodecError> {
        let mut fields = FieldReader::open(value, "SimpleObj")?;
        Ok(Self {
            property_string: fields.next()?,
            property_int: fields.next()?,
            property_obj: fields.next()?,
            property_list_string: fields.next()?,
            property_list_int: fields.next()?,
            property_list_obj: fields.next()?,
        })
    }
}

impl Shaped for EmptyObj {
    fn shape() -> TypeShape {
        TypeShape::object("EmptyObj")
    }
    fn to_value(&self) -> Value {
        Record::new("EmptyObj").into()
    }
    fn from_value(value: Value) -> Result<Self, CodecError> {
        FieldReader::open(value, "EmptyObj").map(|_| EmptyObj)
    }
}

impl Shaped for Person {
    fn shape() -> TypeShape {
        TypeShape::object("Person")
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
        Ok(Self { name: fields.next()?, age: fields.next()?, county: fields.next()? })
    }
}

impl Shaped for Chapter {
    fn shape() -> TypeShape {
        TypeShape::object("Chapter")
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
        Ok(Self { name: fields.next()?, page_begin: fields.next()?, page_end: fields.next()? })
    }
}

impl Shaped for Book {
    fn shape() -> TypeShape {
        TypeShape::object("Book")
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
        Ok(Self {
            title: fields.next()?,
            authors: fields.next()?,
            chapters: fields.next()?,
            total_page_count: fields.next()?,
            price: fields.next()?,
        })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SAMPLES
// ————————————————————————————————————————————————————————————————————————————

pub fn populated_simple_obj() -> SimpleObj {
    let sub = |s: &str| Some(SimpleSubObj { property_string: Some(s.to_string()) });
    SimpleObj {
        property_string: Some("Value String".into()),
        property_int: 42,
        property_obj: sub("Subobject String Value"),
        property_list_string: Some(vec![
            Some("String Value 1".into()),
            Some("String Value 2".into()),
            Some("String Value3".into()),
        ]),
        property_list_int: Some(vec![5, 6, 7]),
        property_list_obj: Some(vec![
            sub("Subobject String Value 1"),
            sub("Subobject String Value 2"),
            sub("Subobject String Value 3"),
        ]),
    }
}

pub fn sample_book() -> Book {
    let mut authors = vec![Person { name: Some("Author A".into()), age: 53, county: Some("United States".into()) }];
    for letter in 'B'..='Q' {
        authors.push(Person { name: Some(format!("Author {letter}")), age: 47, county: Some("Canada".into()) });
    }
    let chapters = (1..=10)
        .map(|i| Chapter { name: Some(format!("Chapter {i}")), page_begin: 5, page_end: 10 })
        .collect();
    Book {
        title: Some("The Great Voyage".into()),
        authors: Some(authors),
        chapters: Some(chapters),
        total_page_count: 300,
        price: 50,
    }
}
