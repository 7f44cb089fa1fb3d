//! Input-deck rendering for the quantum-chemistry engine.
//!
//! Decks are plain text in the ORCA input format. Every deck reads its geometry from an
//! XYZ file in the stage directory (`* xyzfile <charge> <multiplicity> <file>`), so the
//! rendered text only refers to artifacts by file name.

use super::config::PipelineConfig;
use crate::core::models::reaction::{ActiveAtomPair, ConstraintSet};

const SCF_BLOCK: &str = "%scf\n   MaxIter 999\n   CNVDIIS true\n   CNVSOSCF true\n   AutoStart true\nend\n";

/// The shape of one stage's input deck.
#[derive(Debug, Clone, PartialEq)]
pub enum InputDeck {
    /// Crude geometry optimization.
    Optimization { structure: String },
    /// Optimization followed by numerical frequencies.
    OptimizationFrequency { structure: String },
    /// Relaxed scan of the active bond from its current length to the configured target.
    ConstrainedScan {
        structure: String,
        pair: ActiveAtomPair,
        start_distance: f64,
        constraints: ConstraintSet,
    },
    /// NEB-TS between two end structures; the deck's own geometry is the start.
    Neb { start: String, end: String },
    /// TS optimization with a hybrid Hessian on the active atoms, then IRC both ways.
    TsIrc {
        structure: String,
        pair: ActiveAtomPair,
    },
    /// SMD-solvated single-point energy.
    SolvatedSinglePoint { structure: String },
}

impl InputDeck {
    /// The XYZ file the deck reads its geometry from.
    pub fn structure(&self) -> &str {
        match self {
            Self::Optimization { structure }
            | Self::OptimizationFrequency { structure }
            | Self::ConstrainedScan { structure, .. }
            | Self::TsIrc { structure, .. }
            | Self::SolvatedSinglePoint { structure } => structure,
            Self::Neb { start, .. } => start,
        }
    }

    pub fn render(&self, config: &PipelineConfig) -> String {
        let chem = &config.chemistry;
        let pal = format!("%pal nprocs {} end\n\n", chem.processors);
        let geometry = format!(
            "* xyzfile {} {} {}\n",
            chem.charge,
            chem.multiplicity,
            self.structure()
        );

        let body = match self {
            Self::Optimization { .. } => format!(
                "!Opt {} {} {}\n{}",
                chem.method, chem.basis_set, chem.keywords, SCF_BLOCK
            ),
            Self::OptimizationFrequency { .. } => format!(
                "!Opt NumFreq {} {} {}\n{}",
                chem.method, chem.frequency_basis_set, chem.keywords, SCF_BLOCK
            ),
            Self::ConstrainedScan {
                pair,
                start_distance,
                constraints,
                ..
            } => {
                let mut geom = format!(
                    "%geom Scan\n        B {} {} = {:.3}, {}, {}\n        end\n",
                    pair.first(),
                    pair.second(),
                    start_distance,
                    config.scan.target_distance,
                    config.scan.steps
                );
                if let Some(directives) = constraints.directives() {
                    geom.push_str("  Constraints\n");
                    for directive in directives {
                        geom.push_str(&format!("  {}\n", directive.trim_end()));
                    }
                    geom.push_str("  end\n");
                }
                geom.push_str("end\n");
                format!(
                    "!Opt {} {} {}\n{}{}",
                    chem.method, chem.basis_set, chem.keywords, SCF_BLOCK, geom
                )
            }
            Self::Neb { end, .. } => format!(
                "!NEB-TS Opt {} {} {}\n{}%neb\n   neb_end_xyzfile \"{}\"\n   NImages {}\n   PrintLevel 1\n   PreOpt_Ends False\n   MaxIter {}\nend\n",
                chem.method,
                chem.basis_set,
                chem.keywords,
                SCF_BLOCK,
                end,
                config.neb.images,
                config.neb.max_iterations
            ),
            Self::TsIrc { pair, .. } => {
                let active = format!("{{{} {}}}", pair.first(), pair.second());
                format!(
                    "! OptTS NumFreq {} {} {}\n{}%geom\n   TS_Active_Atoms {}\n     end\n   Calc_Hess true\n   Hybrid_Hess {} end\nend\n\n%irc\n   MaxIter {}\n   PrintLevel 1\n   Direction both\nend\n\n",
                    chem.method,
                    chem.frequency_basis_set,
                    chem.keywords,
                    SCF_BLOCK,
                    active,
                    active,
                    config.irc.max_iterations
                )
            }
            Self::SolvatedSinglePoint { .. } => {
                let solv = &config.solvation;
                format!(
                    "!{} {} {}\n!CPCM\n%cpcm\n    smd true\n    SMDsolvent \"{}\"\nend\n{}",
                    solv.method, solv.basis_set, solv.keywords, solv.solvent, SCF_BLOCK
                )
            }
        };

        format!("{}{}{}", body, pal, geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::PipelineConfigBuilder;

    fn config() -> PipelineConfig {
        PipelineConfigBuilder::new().build().unwrap()
    }

    fn pair() -> ActiveAtomPair {
        ActiveAtomPair::new(0, 5).unwrap()
    }

    #[test]
    fn optimization_deck_has_method_resources_and_geometry() {
        let deck = InputDeck::Optimization {
            structure: "conf1.xyz".into(),
        }
        .render(&config());

        assert!(deck.starts_with(
            "!Opt B97-D3 def2-SVP def2-SVP/C def2/J RIJCOSX Grid6 NormalSCF NoPop NoFinalGrid\n%scf\n"
        ));
        assert!(deck.contains("%pal nprocs 16 end\n\n"));
        assert!(deck.ends_with("* xyzfile 0 1 conf1.xyz\n"));
    }

    #[test]
    fn frequency_deck_requests_numfreq() {
        let deck = InputDeck::OptimizationFrequency {
            structure: "ts_IRC_F.xyz".into(),
        }
        .render(&config());
        assert!(deck.starts_with("!Opt NumFreq B97-D3"));
        assert!(deck.ends_with("* xyzfile 0 1 ts_IRC_F.xyz\n"));
    }

    #[test]
    fn scan_deck_scans_active_bond_to_target() {
        let deck = InputDeck::ConstrainedScan {
            structure: "opt.xyz".into(),
            pair: pair(),
            start_distance: 1.53219,
            constraints: ConstraintSet::Absent,
        }
        .render(&config());

        assert!(deck.contains("%geom Scan\n        B 0 5 = 1.532, 3.98, 10\n        end\nend\n"));
        assert!(!deck.contains("Constraints"));
    }

    #[test]
    fn scan_target_is_written_as_configured() {
        let cfg = PipelineConfigBuilder::new()
            .scan_target_distance(3.305)
            .build()
            .unwrap();
        let deck = InputDeck::ConstrainedScan {
            structure: "opt.xyz".into(),
            pair: pair(),
            start_distance: 1.5,
            constraints: ConstraintSet::Absent,
        }
        .render(&cfg);

        assert!(deck.contains("B 0 5 = 1.500, 3.305, 10\n"));
    }

    #[test]
    fn scan_deck_forwards_constraints_verbatim_in_order() {
        let deck = InputDeck::ConstrainedScan {
            structure: "opt.xyz".into(),
            pair: pair(),
            start_distance: 2.0,
            constraints: ConstraintSet::from_lines(["{ B 1 2 C }", "{ A 3 4 5 C }"]),
        }
        .render(&config());

        assert!(deck.contains("  Constraints\n  { B 1 2 C }\n  { A 3 4 5 C }\n  end\nend\n"));
    }

    #[test]
    fn neb_deck_names_end_structure_and_starts_from_start() {
        let deck = InputDeck::Neb {
            start: "start.xyz".into(),
            end: "end.xyz".into(),
        }
        .render(&config());

        assert!(deck.starts_with("!NEB-TS Opt"));
        assert!(deck.contains("neb_end_xyzfile \"end.xyz\"\n   NImages 14\n"));
        assert!(deck.contains("MaxIter 1000\n"));
        assert!(deck.ends_with("* xyzfile 0 1 start.xyz\n"));
    }

    #[test]
    fn ts_deck_marks_active_atoms_once_per_block() {
        let deck = InputDeck::TsIrc {
            structure: "neb_TSOpt.xyz".into(),
            pair: pair(),
        }
        .render(&config());

        assert!(deck.starts_with("! OptTS NumFreq"));
        assert!(deck.contains("TS_Active_Atoms {0 5}\n"));
        assert!(deck.contains("Hybrid_Hess {0 5} end\n"));
        assert!(deck.contains("%irc\n   MaxIter 15\n   PrintLevel 1\n   Direction both\nend\n"));
        assert_eq!(deck.matches("%irc").count(), 1);
    }

    #[test]
    fn single_point_deck_uses_solvation_settings() {
        let cfg = PipelineConfigBuilder::new()
            .solvent("WATER")
            .processors(8)
            .build()
            .unwrap();
        let deck = InputDeck::SolvatedSinglePoint {
            structure: "ts.xyz".into(),
        }
        .render(&cfg);

        assert!(deck.starts_with("!M06 def2-TZVP def2-TZVP/C def2/J"));
        assert!(deck.contains("!CPCM\n%cpcm\n    smd true\n    SMDsolvent \"WATER\"\nend\n"));
        assert!(deck.contains("%pal nprocs 8 end"));
    }
}
