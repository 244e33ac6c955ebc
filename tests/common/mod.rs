use fragment_typegen::TypegenSchema;

const STARWARS_SDL: &str = include_str!("../fixtures/starwars.graphql");

pub(crate) fn starwars_schema() -> TypegenSchema {
    TypegenSchema::parse(STARWARS_SDL, "starwars.graphql").unwrap()
}
