use fragment_typegen::schema_printer::print_input_object_types;
use fragment_typegen::schema_printer::print_type_brands;
use insta::assert_snapshot;

use crate::common::starwars_schema;

#[test]
fn prints_input_types_of_fixture_schema() {
    assert_snapshot!(print_input_object_types(&starwars_schema()), @r###"
    export interface FilmFilter {
      /**
       * Only films directed by this person.
       */
      directorID?: string | null;
      episodes?: Episode[] | null;
    }

    export interface RateFilmInput {
      filmID: string;
      stars?: number;
    }

    export type Episode = "NEWHOPE" | "EMPIRE" | "JEDI";
    "###);
}

#[test]
fn prints_brands_of_fixture_schema() {
    assert_snapshot!(print_type_brands(&starwars_schema()), @r###"
    export enum Film {};
    export enum Person {};
    export enum Planet {};
    export enum Species {};
    export enum Starship {};
    export enum Vehicle {};
    "###);
}
