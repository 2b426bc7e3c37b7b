mod use_random;

pub(crate) use use_random::use_random_id_for;
