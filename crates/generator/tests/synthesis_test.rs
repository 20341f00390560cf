//! Integration tests for command synthesis and parameter resolution

use odata_cmdgen_common::{
    ClassKind, Command, CommandName, GeneratorConfig, HttpMethod, MethodKind, MethodParameter,
    MethodReturn, OperationKind, ParameterLocation, ParameterType, PrimitiveType, SchemaClass,
    SchemaGraph, SchemaMethod, SchemaProperty, SetMembership, TypeRef, Verb,
};
use odata_cmdgen_generator::{CommandGenerator, GenerationOutput, ParameterResolver};
use odata_cmdgen_parser::load_schema;
use std::collections::HashSet;
use std::path::PathBuf;

fn library() -> SchemaGraph {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../schemas/library.yaml");
    load_schema(&path).unwrap()
}

fn generate(graph: &SchemaGraph) -> GenerationOutput {
    CommandGenerator::new(graph, GeneratorConfig::default())
        .generate()
        .unwrap()
}

fn find<'a>(output: &'a GenerationOutput, name: &str) -> &'a Command {
    output
        .commands
        .iter()
        .find(|c| c.name.to_string() == name)
        .unwrap_or_else(|| panic!("no command {}", name))
}

fn names_for_route(output: &GenerationOutput, route: &str) -> HashSet<String> {
    output
        .commands
        .iter()
        .filter(|c| c.route == route)
        .map(|c| c.name.to_string())
        .collect()
}

fn sets(names: &[&str]) -> SetMembership {
    SetMembership::only(names.iter().copied())
}

#[test]
fn test_every_command_is_valid_and_uniquely_named() {
    let graph = library();
    let output = generate(&graph);

    let mut names = HashSet::new();
    for command in &output.commands {
        command.validate().unwrap();
        assert!(names.insert(command.name.to_string()), "duplicate {}", command.name);
    }
}

#[test]
fn test_collection_without_insert_or_update() {
    let graph = library();
    let output = generate(&graph);

    let expected: HashSet<String> = [
        "Get-Books",
        "Remove-Books",
        "Invoke-CheckoutBooks",
        "Invoke-SimilarBooks",
        "Invoke-RecentBooks",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    assert_eq!(names_for_route(&output, "books/{BookId}"), expected);

    let get = find(&output, "Get-Books");
    assert_eq!(get.operation, OperationKind::Search);
    assert_eq!(get.call_url_template, "books/{BookId ?? \"\"}");
    assert_eq!(get.default_parameter_set().unwrap().name, "Search");
    assert!(get.has_parameter_set("Get"));
    assert!(get.is_referenceable);
    assert_eq!(get.id_parameter.as_deref(), Some("BookId"));

    let id = get.parameter("BookId").unwrap();
    assert!(id.mandatory);
    assert!(id.from_pipeline_by_name);
    assert_eq!(id.membership, sets(&["Get"]));
    assert!(get.parameter("Select").unwrap().membership.is_all());
    assert!(get.parameter("Expand").unwrap().membership.is_all());
    assert_eq!(get.parameter("Top").unwrap().membership, sets(&["Search"]));
    assert_eq!(get.parameter("Filter").unwrap().wire_name.as_deref(), Some("$filter"));

    let remove = find(&output, "Remove-Books");
    assert_eq!(remove.http_method, HttpMethod::Delete);
    assert_eq!(remove.call_url_template, "books/{BookId}");
    assert!(remove.parameter("BookId").unwrap().mandatory);
}

#[test]
fn test_singleton_delete_has_no_identifier() {
    let graph = library();
    let output = generate(&graph);

    let remove = find(&output, "Remove-Me");
    assert_eq!(remove.operation, OperationKind::Delete);
    assert_eq!(remove.http_method, HttpMethod::Delete);
    assert_eq!(remove.call_url_template, "me");
    assert_eq!(remove.id_parameter, None);
    assert!(remove
        .parameters
        .iter()
        .all(|p| p.location != ParameterLocation::Path));
    assert_eq!(remove.default_parameter_set().unwrap().name, "Delete");
    remove.validate().unwrap();
}

#[test]
fn test_reference_navigation_uses_reference_commands() {
    let graph = library();
    let output = generate(&graph);

    let names = names_for_route(&output, "books/{BookId}/authors/{AuthorId}");
    assert!(names.contains("Get-BooksAuthors"));
    assert!(names.contains("New-BooksAuthorsReference"));
    assert!(names.contains("Remove-BooksAuthorsReference"));
    assert!(!names.contains("New-BooksAuthors"));
    assert!(!names.contains("Remove-BooksAuthors"));

    let add = find(&output, "New-BooksAuthorsReference");
    assert_eq!(add.operation, OperationKind::PostRef);
    assert_eq!(add.http_method, HttpMethod::Post);
    assert_eq!(add.call_url_template, "books/{BookId}/authors/$ref");
    assert_eq!(add.reference_target.as_deref(), Some("Get-Authors"));

    let url = add.parameter("ReferenceUrl").unwrap();
    assert_eq!(url.param_type, ParameterType::Url);
    assert!(url.mandatory);
    assert!(url.from_pipeline_value);
    assert_eq!(url.location, ParameterLocation::Body);

    let remove = find(&output, "Remove-BooksAuthorsReference");
    assert_eq!(remove.operation, OperationKind::DeleteRef);
    assert_eq!(remove.call_url_template, "books/{BookId}/authors/$ref");
    let url = remove.parameter("ReferenceUrl").unwrap();
    assert_eq!(url.location, ParameterLocation::Query);
    assert_eq!(url.wire_name.as_deref(), Some("$id"));

    assert!(!find(&output, "Get-BooksAuthors").is_referenceable);
}

#[test]
fn test_single_valued_reference_is_set_with_put() {
    let graph = library();
    let output = generate(&graph);

    let set = find(&output, "Set-MeFavoriteReference");
    assert_eq!(set.http_method, HttpMethod::Put);
    assert_eq!(set.call_url_template, "me/favorite/$ref");
    assert_eq!(set.reference_target.as_deref(), Some("Get-Books"));

    let remove = find(&output, "Remove-MeFavoriteReference");
    assert_eq!(remove.call_url_template, "me/favorite/$ref");
    assert!(remove.parameter("ReferenceUrl").is_none());

    let get = find(&output, "Get-MeFavorite");
    assert_eq!(get.operation, OperationKind::Get);
    assert_eq!(get.parameter_sets.len(), 1);
    assert!(get.parameter("Filter").is_none());
}

#[test]
fn test_derived_types_get_their_own_parameter_sets() {
    let graph = library();
    let output = generate(&graph);

    let create = find(&output, "New-Catalog");
    assert_eq!(create.call_url_template, "catalog");
    let set_names: Vec<&str> = create.parameter_sets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(set_names, vec!["Book", "AudioBook", "EBook"]);
    assert_eq!(create.default_parameter_set().unwrap().name, "Book");

    let title = create.parameter("Title").unwrap();
    assert_eq!(title.membership, sets(&["Book", "AudioBook", "EBook"]));
    assert_eq!(title.wire_name.as_deref(), Some("title"));

    let narrator = create.parameter("NarratorName").unwrap();
    assert_eq!(narrator.membership, sets(&["AudioBook"]));
    assert_eq!(narrator.derived_type_discriminator.as_deref(), Some("library.AudioBook"));

    // Declared on both siblings: merged, no longer tied to one type
    let format = create.parameter("Format").unwrap();
    assert_eq!(format.membership, sets(&["AudioBook", "EBook"]));
    assert_eq!(format.derived_type_discriminator, None);

    let switch = create.parameter("AudioBook").unwrap();
    assert_eq!(switch.param_type, ParameterType::Switch);
    assert_eq!(switch.location, ParameterLocation::TypeDiscriminator);
    assert!(switch.mandatory);
    assert_eq!(switch.membership, sets(&["AudioBook"]));

    assert_eq!(
        create.parameter("Dimensions").unwrap().param_type,
        ParameterType::Complex("library.Dimensions".to_string())
    );
    for excluded in ["Id", "Rating", "Tags", "Isbn", "Authors", "Chapters"] {
        assert!(create.parameter(excluded).is_none(), "{} should be excluded", excluded);
    }

    // Immutable properties may be changed by update but not supplied on create
    let update = find(&output, "Update-Catalog");
    assert_eq!(update.call_url_template, "catalog/{CatalogId}");
    assert!(update.parameter("Isbn").is_some());
    assert!(update.parameter("Rating").is_none());
    assert_eq!(update.parameter("CatalogId").unwrap().membership, SetMembership::All);
}

#[test]
fn test_function_overloads_pick_minimal_default() {
    let graph = library();
    let output = generate(&graph);

    let similar = find(&output, "Invoke-SimilarBooks");
    assert_eq!(similar.operation, OperationKind::Function);
    assert_eq!(similar.http_method, HttpMethod::Get);
    assert_eq!(similar.call_url_template, "books/{BookId}/library.similar");

    let set_names: Vec<&str> = similar.parameter_sets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(set_names, vec!["Similar", "SimilarGenreTop", "SimilarGenre"]);
    assert_eq!(similar.default_parameter_set().unwrap().name, "Similar");

    let genre = similar.parameter("Genre").unwrap();
    assert_eq!(genre.location, ParameterLocation::FunctionArgument);
    assert_eq!(genre.membership, sets(&["SimilarGenreTop", "SimilarGenre"]));
    assert!(genre.mandatory);

    // The `top` argument wins over the $top query option
    let top = similar.parameter("Top").unwrap();
    assert_eq!(top.location, ParameterLocation::FunctionArgument);
    assert!(similar.parameter("Filter").unwrap().membership.is_all());
}

fn argument(name: &str, nullable: bool) -> MethodParameter {
    MethodParameter {
        name: name.to_string(),
        type_ref: TypeRef::Primitive(PrimitiveType::String),
        is_collection: false,
        nullable,
    }
}

#[test]
fn test_overload_arguments_keep_mandatory_per_set() {
    let mut graph = SchemaGraph::new("library", "LibraryService");
    let mut shelf = SchemaClass::new("Shelf", ClassKind::Entity);
    shelf.key = Some("code".to_string());
    let shelf = graph.add_class(shelf).unwrap();
    graph
        .add_property(shelf, SchemaProperty::new("code", TypeRef::Primitive(PrimitiveType::String)))
        .unwrap();
    let mut shelves = SchemaProperty::new("shelves", TypeRef::Class(shelf));
    shelves.is_collection = true;
    graph.add_container_property(shelves).unwrap();

    let returns = || {
        Some(MethodReturn {
            type_ref: TypeRef::Primitive(PrimitiveType::String),
            is_collection: false,
        })
    };
    let mut by_x = SchemaMethod::new("find", MethodKind::Function);
    by_x.parameters = vec![argument("x", false)];
    by_x.returns = returns();
    graph.add_method(shelf, by_x).unwrap();
    let mut by_x_y = SchemaMethod::new("find", MethodKind::Function);
    by_x_y.parameters = vec![argument("x", true), argument("y", true)];
    by_x_y.returns = returns();
    graph.add_method(shelf, by_x_y).unwrap();

    let output = generate(&graph);
    let find_command = find(&output, "Invoke-FindShelves");
    find_command.validate().unwrap();

    let x = find_command.parameter("X").unwrap();
    assert_eq!(x.membership, sets(&["FindX", "FindXY"]));
    assert!(x.is_mandatory_in("FindX"));
    assert!(!x.is_mandatory_in("FindXY"));

    let y = find_command.parameter("Y").unwrap();
    assert!(!y.is_mandatory_in("FindXY"));

    // Fewest mandatory arguments wins
    assert_eq!(find_command.default_parameter_set().unwrap().name, "FindXY");
}

#[test]
fn test_actions_and_collection_bound_functions() {
    let graph = library();
    let output = generate(&graph);

    let checkout = find(&output, "Invoke-CheckoutBooks");
    assert_eq!(checkout.http_method, HttpMethod::Post);
    assert_eq!(checkout.call_url_template, "books/{BookId}/library.checkout");
    assert_eq!(checkout.id_parameter.as_deref(), Some("BookId"));
    let member = checkout.parameter("MemberId").unwrap();
    assert!(member.mandatory);
    assert_eq!(member.location, ParameterLocation::Body);
    assert!(!checkout.parameter("Days").unwrap().mandatory);
    assert_eq!(
        checkout.resource_type, None,
        "a primitive return has no resource type"
    );

    let recent = find(&output, "Invoke-RecentBooks");
    assert_eq!(recent.call_url_template, "books/library.recent");
    assert!(recent.parameter("BookId").is_none());

    // Collection-bound methods are not offered on single-valued routes
    assert!(output
        .commands
        .iter()
        .all(|c| c.name.to_string() != "Invoke-RecentMeFavorite"));
    assert!(output
        .commands
        .iter()
        .any(|c| c.name.to_string() == "Invoke-CheckoutMeFavorite"));
}

#[test]
fn test_computed_property_vetoes_writes() {
    let mut graph = SchemaGraph::new("library", "LibraryService");
    let mut loan = SchemaClass::new("Loan", ClassKind::Entity);
    loan.key = Some("id".to_string());
    let loan = graph.add_class(loan).unwrap();
    graph
        .add_property(loan, SchemaProperty::new("id", TypeRef::Primitive(PrimitiveType::Int64)))
        .unwrap();
    let mut loans = SchemaProperty::new("loans", TypeRef::Class(loan));
    loans.is_collection = true;
    loans.is_computed = true;
    graph.add_container_property(loans).unwrap();

    let output = generate(&graph);
    let names: Vec<String> = output.commands.iter().map(|c| c.name.to_string()).collect();
    assert_eq!(names, vec!["Get-Loans"]);
    assert_eq!(
        output.commands[0].parameter("LoanId").unwrap().param_type,
        ParameterType::Primitive(PrimitiveType::Int64)
    );
}

fn book_hierarchy() -> (SchemaGraph, odata_cmdgen_common::ClassId) {
    let mut graph = SchemaGraph::new("library", "LibraryService");
    let mut book = SchemaClass::new("Book", ClassKind::Entity);
    book.key = Some("id".to_string());
    let book = graph.add_class(book).unwrap();
    let audio = graph
        .add_class(SchemaClass::new("AudioBook", ClassKind::Entity))
        .unwrap();
    graph.set_base(audio, book).unwrap();

    let string = TypeRef::Primitive(PrimitiveType::String);
    graph.add_property(book, SchemaProperty::new("id", string)).unwrap();
    graph.add_property(book, SchemaProperty::new("title", string)).unwrap();
    graph
        .add_property(audio, SchemaProperty::new("narratorName", string))
        .unwrap();
    (graph, book)
}

fn post_command() -> Command {
    Command::new(
        CommandName::new(Verb::New, "Books"),
        OperationKind::Post,
        HttpMethod::Post,
        "books",
        "books/{BookId}",
    )
}

#[test]
fn test_derived_only_property_in_derived_set() {
    let (graph, book) = book_hierarchy();
    let mut command = post_command();
    ParameterResolver::new(&graph).resolve(&mut command, book).unwrap();

    assert_eq!(command.parameter("NarratorName").unwrap().membership, sets(&["AudioBook"]));
    assert_eq!(command.parameter("Title").unwrap().membership, sets(&["Book", "AudioBook"]));
    assert!(command.parameter("Id").is_none());
    command.validate().unwrap();
}

#[test]
fn test_resolver_is_idempotent() {
    let (graph, book) = book_hierarchy();
    let resolver = ParameterResolver::new(&graph);

    let mut command = post_command();
    resolver.resolve(&mut command, book).unwrap();
    let first = command.clone();
    resolver.resolve(&mut command, book).unwrap();

    assert_eq!(command, first);
}

#[test]
fn test_abstract_base_gets_no_set() {
    let (mut graph, _) = book_hierarchy();
    let mut shelf_item = SchemaClass::new("ShelfItem", ClassKind::Entity);
    shelf_item.is_abstract = true;
    shelf_item.key = Some("code".to_string());
    let shelf_item = graph.add_class(shelf_item).unwrap();
    graph
        .add_property(
            shelf_item,
            SchemaProperty::new("code", TypeRef::Primitive(PrimitiveType::String)),
        )
        .unwrap();
    let map = graph.add_class(SchemaClass::new("Map", ClassKind::Entity)).unwrap();
    graph.set_base(map, shelf_item).unwrap();
    graph
        .add_property(map, SchemaProperty::new("scale", TypeRef::Primitive(PrimitiveType::Int32)))
        .unwrap();

    let mut command = post_command();
    ParameterResolver::new(&graph).resolve(&mut command, shelf_item).unwrap();
    let set_names: Vec<&str> = command.parameter_sets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(set_names, vec!["Map"]);
    assert_eq!(command.default_parameter_set().unwrap().name, "Map");
    assert!(command.parameter("Code").is_none());

    // A hierarchy with nothing concrete cannot be sent at all
    let mut placeholder = SchemaClass::new("Placeholder", ClassKind::Entity);
    placeholder.is_abstract = true;
    let placeholder = graph.add_class(placeholder).unwrap();
    let mut command = post_command();
    assert!(ParameterResolver::new(&graph)
        .resolve(&mut command, placeholder)
        .is_err());
}
