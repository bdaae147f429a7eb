/// Maps a strum-backed enum onto a Postgres `TEXT` column.
///
/// The enum must derive `AsExpression`, `FromSqlRow` with `sql_type = Text`,
/// plus strum's `AsRefStr` and `EnumString`.
macro_rules! impl_text_sql {
    ($ty:ty) => {
        impl diesel::serialize::ToSql<diesel::sql_types::Text, diesel::pg::Pg> for $ty {
            fn to_sql<'b>(
                &'b self,
                out: &mut diesel::serialize::Output<'b, '_, diesel::pg::Pg>,
            ) -> diesel::serialize::Result {
                use std::io::Write;

                out.write_all(self.as_ref().as_bytes())?;
                Ok(diesel::serialize::IsNull::No)
            }
        }

        impl diesel::deserialize::FromSql<diesel::sql_types::Text, diesel::pg::Pg> for $ty {
            fn from_sql(bytes: diesel::pg::PgValue<'_>) -> diesel::deserialize::Result<Self> {
                let raw = <String as diesel::deserialize::FromSql<
                    diesel::sql_types::Text,
                    diesel::pg::Pg,
                >>::from_sql(bytes)?;
                raw.parse::<$ty>()
                    .map_err(|_| format!("Unrecognized {} value: {}", stringify!($ty), raw).into())
            }
        }
    };
}

pub(crate) use impl_text_sql;
