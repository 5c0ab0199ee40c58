/// Sample makes as `(name, abrv)`.
pub const MAKES: &[(&str, &str)] = &[
    ("BMW", "BMW"),
    ("Mercedes-Benz", "MB"),
    ("Audi", "AUD"),
    ("Toyota", "TOY"),
    ("Honda", "HON"),
];

/// Sample models as `(index into MAKES, name, abrv)`.
pub const MODELS: &[(usize, &str, &str)] = &[
    (0, "325i", "325i"),
    (0, "X5", "X5"),
    (0, "M3", "M3"),
    (1, "C-Class", "C"),
    (1, "E-Class", "E"),
    (1, "S-Class", "S"),
    (2, "A4", "A4"),
    (2, "Q7", "Q7"),
    (3, "Camry", "CAM"),
    (3, "Prius", "PRI"),
    (4, "Civic", "CIV"),
    (4, "Accord", "ACC"),
];
