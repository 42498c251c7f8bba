//! Static three-level administrative hierarchy used for the residence step:
//! province (region) → canton (subregion) → district. Read-only, fixed order;
//! the order of the slices is the order the selects present them in.

pub struct Canton {
    pub name: &'static str,
    pub districts: &'static [&'static str],
}

pub struct Province {
    pub name: &'static str,
    pub cantons: &'static [Canton],
}

pub static PROVINCES: &[Province] = &[
    Province {
        name: "San José",
        cantons: &[
            Canton {
                name: "Central",
                districts: &["Carmen", "Merced", "Hospital", "Catedral", "Zapote"],
            },
            Canton {
                name: "Escazú",
                districts: &["Escazú", "San Antonio", "San Rafael"],
            },
            Canton {
                name: "Desamparados",
                districts: &[
                    "Desamparados",
                    "San Rafael Abajo",
                    "San Rafael Arriba",
                    "San Juan de Dios",
                    "San Miguel",
                ],
            },
            Canton {
                name: "Puriscal",
                districts: &["Santiago", "Mercedes Sur", "Barbacoas", "Grifo Alto", "San Rafael"],
            },
            Canton {
                name: "Tarrazú",
                districts: &["San Marcos", "San Lorenzo", "San Carlos"],
            },
        ],
    },
    Province {
        name: "Alajuela",
        cantons: &[
            Canton {
                name: "Central",
                districts: &["Alajuela", "San José", "Carrizal", "San Antonio", "Guácima"],
            },
            Canton {
                name: "San Ramón",
                districts: &["San Ramón", "Santiago", "San Juan", "Piedades Norte", "Piedades Sur"],
            },
            Canton {
                name: "Grecia",
                districts: &["Grecia", "San Isidro", "San José", "San Roque", "Tacares"],
            },
            Canton {
                name: "San Mateo",
                districts: &["San Mateo", "Desmonte", "Jesús María", "Labrador", "Coyolar"],
            },
            Canton {
                name: "Atenas",
                districts: &["Atenas", "Jesús", "Mercedes", "San Isidro", "Escobal"],
            },
        ],
    },
    Province {
        name: "Cartago",
        cantons: &[
            Canton {
                name: "Central",
                districts: &["Oriental", "Occidental", "Carmen", "San Nicolás", "Guadalupe"],
            },
            Canton {
                name: "Paraíso",
                districts: &["Paraíso", "Santiago", "Orosi", "Cachí", "Birrisito"],
            },
            Canton {
                name: "La Unión",
                districts: &["Tres Ríos", "San Diego", "San Juan", "Concepción", "Dulce Nombre"],
            },
            Canton {
                name: "Jiménez",
                districts: &["Juan Viñas", "Tucurrique", "Pejibaye"],
            },
            Canton {
                name: "Turrialba",
                districts: &["Turrialba", "La Suiza", "Peralta", "Santa Cruz", "Chirripó"],
            },
        ],
    },
    Province {
        name: "Heredia",
        cantons: &[
            Canton {
                name: "Central",
                districts: &["Heredia", "Mercedes", "San Francisco", "Ulloa", "Varablanca"],
            },
            Canton {
                name: "Barva",
                districts: &["Barva", "San Pedro", "San Pablo", "San Roque", "Santa Lucía"],
            },
            Canton {
                name: "Santo Domingo",
                districts: &["Santo Domingo", "San Vicente", "San Miguel", "Paracito", "Tures"],
            },
            Canton {
                name: "Santa Bárbara",
                districts: &["Santa Bárbara", "San Pedro", "San Juan", "Jesús", "Santo Domingo"],
            },
            Canton {
                name: "San Rafael",
                districts: &["San Rafael", "San Josecito", "Santiago", "Angeles", "Concepción"],
            },
        ],
    },
    Province {
        name: "Guanacaste",
        cantons: &[
            Canton {
                name: "Liberia",
                districts: &["Liberia", "Cañas Dulces", "Mayorga", "Nacascolo", "Curubandé"],
            },
            Canton {
                name: "Nicoya",
                districts: &["Nicoya", "Mansión", "San Antonio", "Quebrada Honda", "Sámara"],
            },
            Canton {
                name: "Santa Cruz",
                districts: &[
                    "Santa Cruz",
                    "Bolsón",
                    "Veintisiete de Abril",
                    "Tempate",
                    "Cartagena",
                ],
            },
            Canton {
                name: "Bagaces",
                districts: &["Bagaces", "La Fortuna", "Mogote", "Río Naranjo"],
            },
            Canton {
                name: "Carrillo",
                districts: &["Filadelfia", "Palmira", "Sardinal", "Belén"],
            },
        ],
    },
    Province {
        name: "Puntarenas",
        cantons: &[
            Canton {
                name: "Central",
                districts: &["Puntarenas", "Chacarita", "Barranca", "Monteverde", "Isla del Coco"],
            },
            Canton {
                name: "Esparza",
                districts: &[
                    "Espíritu Santo",
                    "San Juan Grande",
                    "Macacona",
                    "San Rafael",
                    "San Jerónimo",
                ],
            },
            Canton {
                name: "Buenos Aires",
                districts: &["Buenos Aires", "Volcán", "Potrero Grande", "Boruca", "Pilas"],
            },
            Canton {
                name: "Montes de Oro",
                districts: &["Miramar", "La Unión", "San Isidro"],
            },
            Canton {
                name: "Osa",
                districts: &["Puerto Cortés", "Palmar", "Sierpe", "Bahía Ballena", "Piedras Blancas"],
            },
        ],
    },
    Province {
        name: "Limón",
        cantons: &[
            Canton {
                name: "Central",
                districts: &["Limón", "Valle La Estrella", "Río Blanco", "Matama", "Cieneguita"],
            },
            Canton {
                name: "Pococí",
                districts: &["Guápiles", "Jiménez", "La Rita", "Roxana", "Cariari"],
            },
            Canton {
                name: "Siquirres",
                districts: &["Siquirres", "Pacuarito", "Florida", "Germania", "Cairo"],
            },
            Canton {
                name: "Talamanca",
                districts: &["Bratsi", "Sixaola", "Cahuita", "Telire"],
            },
            Canton {
                name: "Matina",
                districts: &["Matina", "Bataán", "Carrandí"],
            },
        ],
    },
];

#[must_use]
pub fn province_names() -> Vec<&'static str> {
    PROVINCES.iter().map(|p| p.name).collect()
}

#[must_use]
pub fn find_province(name: &str) -> Option<&'static Province> {
    PROVINCES.iter().find(|p| p.name == name)
}

#[must_use]
pub fn canton_names(province: &str) -> Vec<&'static str> {
    find_province(province)
        .map(|p| p.cantons.iter().map(|c| c.name).collect())
        .unwrap_or_default()
}

#[must_use]
pub fn find_canton(province: &str, canton: &str) -> Option<&'static Canton> {
    find_province(province)?.cantons.iter().find(|c| c.name == canton)
}

#[must_use]
pub fn district_names(province: &str, canton: &str) -> Vec<&'static str> {
    find_canton(province, canton)
        .map(|c| c.districts.to_vec())
        .unwrap_or_default()
}

/// First canton and first district of a province, used to reset the dependent
/// selections when the province changes.
#[must_use]
pub fn default_residence(province: &str) -> Option<(&'static str, &'static str)> {
    let canton = find_province(province)?.cantons.first()?;
    let district = canton.districts.first()?;
    Some((canton.name, district))
}

/// First district of a canton, used to reset the district when the canton
/// changes.
#[must_use]
pub fn default_district(province: &str, canton: &str) -> Option<&'static str> {
    find_canton(province, canton)?.districts.first().copied()
}

/// Whether the full tuple is mutually consistent under the hierarchy.
#[must_use]
pub fn is_valid_residence(province: &str, canton: &str, district: &str) -> bool {
    find_canton(province, canton)
        .map(|c| c.districts.contains(&district))
        .unwrap_or(false)
}
