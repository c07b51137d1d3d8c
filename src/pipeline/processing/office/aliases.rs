use crate::domain::OfficeCategory;

use OfficeCategory::*;

/// Alias vocabulary per category, in normalized form (see `normalize_office`).
pub(super) const ALIASES: &[(OfficeCategory, &[&str])] = &[
    (
        UsPresident,
        &[
            "us president",
            "president of the united states",
            "president of united states",
            "united states president",
            "president and vice president",
            "president vice president",
        ],
    ),
    (
        UsSenate,
        &[
            "us senator",
            "us senate",
            "united states senator",
            "united states senate",
            "senator in congress",
        ],
    ),
    (
        UsHouse,
        &[
            "us representative",
            "us house",
            "us house of representatives",
            "united states representative",
            "united states house of representatives",
            "representative in congress",
            "representative to congress",
            "member of congress",
            "us congress",
        ],
    ),
    (
        Governor,
        &[
            "governor",
            "state governor",
            "governor and lieutenant governor",
            "governor and lt governor",
        ],
    ),
    (
        LieutenantGovernor,
        &["lieutenant governor", "lt governor", "lieut governor"],
    ),
    (
        AttorneyGeneral,
        &["attorney general", "state attorney general"],
    ),
    (SecretaryOfState, &["secretary of state"]),
    (
        StateTreasurer,
        &["state treasurer", "treasurer of state", "general treasurer"],
    ),
    (
        StateAuditor,
        &["state auditor", "auditor of state", "auditor of public accounts"],
    ),
    (
        StateSenate,
        &[
            "state senator",
            "state senate",
            "member of the state senate",
        ],
    ),
    (
        StateHouse,
        &[
            "state representative",
            "state house",
            "state house of representatives",
            "state assembly",
            "assembly member",
            "member of assembly",
            "house of delegates",
            "state delegate",
            "representative in general assembly",
        ],
    ),
    (
        StateSupremeCourt,
        &[
            "supreme court justice",
            "justice of the supreme court",
            "state supreme court",
        ],
    ),
    (Mayor, &["mayor"]),
    (
        CityCouncil,
        &[
            "city council",
            "city council member",
            "city councilman",
            "city councilor",
            "council member",
            "councilmember",
            "alderman",
            "city commissioner council",
        ],
    ),
    (CityCommission, &["city commission", "city commissioner"]),
    (
        CountyCommission,
        &[
            "county commission",
            "county commissioner",
            "board of county commissioners",
            "county board of supervisors",
            "county supervisor",
        ],
    ),
    (
        SchoolBoard,
        &[
            "school board",
            "school board member",
            "board of education",
            "school committee",
            "school director",
        ],
    ),
    (Sheriff, &["sheriff", "county sheriff"]),
    (Constable, &["constable"]),
    (Coroner, &["coroner", "county coroner"]),
    (Surveyor, &["surveyor", "county surveyor"]),
    (
        CountyClerk,
        &[
            "county clerk",
            "clerk of court",
            "circuit clerk",
            "clerk of the circuit court",
        ],
    ),
    (
        CountyAttorney,
        &[
            "county attorney",
            "district attorney",
            "prosecuting attorney",
            "commonwealths attorney",
        ],
    ),
    (JusticeOfThePeace, &["justice of the peace"]),
    (
        CircuitJudge,
        &["circuit judge", "circuit court judge", "judge of the circuit court"],
    ),
    (
        DistrictJudge,
        &["district judge", "district court judge", "judge of the district court"],
    ),
    (
        CountyJudge,
        &["county judge", "county court judge", "judge of the county court"],
    ),
    (
        Judge,
        &[
            "judge",
            "probate judge",
            "magistrate",
            "magistrate judge",
            "municipal judge",
        ],
    ),
];

/// Tokens that carry no meaning for partial matching.
pub(super) const STOPWORDS: &[&str] = &["of", "the", "and", "for", "in", "to", "a", "an", "at"];

/// Jurisdictional qualifiers. An input made only of these never matches by
/// containment ("County" alone says nothing about the office).
pub(super) const QUALIFIERS: &[&str] = &[
    "us", "united", "states", "state", "county", "city", "town", "district", "court", "member",
    "board", "general",
];

pub(super) const LOCAL_KEYWORDS: &[&str] = &["state", "county", "city", "town", "local"];

pub(super) const JUDICIAL_KEYWORDS: &[&str] = &["judge", "justice", "court", "magistrate", "orphan"];
