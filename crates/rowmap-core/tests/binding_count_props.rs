//! Column-binding counts hold for every valid declaration

use proptest::prelude::*;
use rowmap_core::{
    extract, generate, Catalog, EntityDeclaration, FieldDeclaration, GenerationError,
    KeyGeneration, OperationKind, SqlType,
};

struct Generated;

const SCALAR_TYPES: [SqlType; 7] = [
    SqlType::Integer,
    SqlType::Real,
    SqlType::Text,
    SqlType::Boolean,
    SqlType::Blob,
    SqlType::Date,
    SqlType::Timestamp,
];

fn declaration(
    text_key: bool,
    generated: bool,
    fields: &[(usize, bool, bool)],
) -> EntityDeclaration {
    let key = if text_key {
        FieldDeclaration::sql("id", SqlType::Text).primary_key()
    } else if generated {
        FieldDeclaration::sql("id", SqlType::Integer)
            .primary_key()
            .generated()
    } else {
        FieldDeclaration::sql("id", SqlType::Integer).primary_key()
    };

    fields.iter().enumerate().fold(
        EntityDeclaration::new::<Generated>("Generated").field(key),
        |decl, (i, (ty, nullable, unique))| {
            let mut field =
                FieldDeclaration::sql(format!("c{}", i), SCALAR_TYPES[*ty]).nullable(*nullable);
            if *unique {
                field = field.unique();
            }
            decl.field(field)
        },
    )
}

proptest! {
    #[test]
    fn binding_counts_match_column_count(
        text_key in any::<bool>(),
        generated in any::<bool>(),
        fields in prop::collection::vec((0usize..7, any::<bool>(), any::<bool>()), 0..10),
    ) {
        let decls = vec![declaration(text_key, generated, &fields)];
        let meta = extract(&decls[0], &Catalog::new(&decls)).unwrap();
        let n = meta.column_count();
        prop_assert_eq!(n, fields.len() + 1);

        let count = |kind: OperationKind| generate(&meta, &kind).map(|t| t.column_binding_count());

        prop_assert_eq!(count(OperationKind::CreateTable), Ok(0));
        prop_assert_eq!(count(OperationKind::Insert), Ok(n));
        prop_assert_eq!(count(OperationKind::Upsert), Ok(n));
        prop_assert_eq!(count(OperationKind::Delete), Ok(1));
        prop_assert_eq!(count(OperationKind::SelectByKey), Ok(1));
        prop_assert_eq!(count(OperationKind::SelectAll), Ok(0));
        prop_assert_eq!(count(OperationKind::Count), Ok(0));

        if n > 1 {
            prop_assert_eq!(count(OperationKind::Update), Ok(n));
        } else {
            prop_assert_eq!(
                count(OperationKind::Update),
                Err(GenerationError::EmptyUpdate { entity: "Generated".into() })
            );
        }

        match meta.key_generation() {
            KeyGeneration::Store => {
                prop_assert_eq!(count(OperationKind::InsertGenerated), Ok(n - 1));
            }
            KeyGeneration::Caller => {
                prop_assert!(count(OperationKind::InsertGenerated).is_err());
            }
        }

        prop_assert_eq!(
            generate(&meta, &OperationKind::Upsert),
            generate(&meta, &OperationKind::Upsert)
        );
    }

    #[test]
    fn foreign_key_select_binds_one_column(nullable in any::<bool>()) {
        struct Owner;
        struct Child;
        let decls = vec![
            EntityDeclaration::new::<Owner>("Owner")
                .field(FieldDeclaration::sql("id", SqlType::Integer).primary_key()),
            EntityDeclaration::new::<Child>("Child")
                .field(FieldDeclaration::sql("id", SqlType::Integer).primary_key())
                .field(FieldDeclaration::reference::<Owner>("owner").nullable(nullable)),
        ];
        let meta = extract(&decls[1], &Catalog::new(&decls)).unwrap();
        let template = generate(&meta, &OperationKind::SelectByForeignKey("owner".into())).unwrap();
        prop_assert_eq!(template.column_binding_count(), 1);
        prop_assert_eq!(template.params().len(), 3);
    }
}
